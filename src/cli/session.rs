//! zenith login / logout / whoami

use serde::Serialize;

use crate::cli::Context;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::session::{Identity, LoginOutcome};

#[derive(Serialize)]
struct SessionReport {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    identity: Option<Identity>,
}

fn describe(human: &mut HumanOutput, identity: &Identity) {
    human.push_summary("name", identity.name.clone());
    human.push_summary("email", identity.email.clone());
    human.push_summary("id", identity.id.clone());
}

pub async fn run_login(ctx: &Context) -> Result<()> {
    let (_lock, mut app) = ctx.open_app()?;
    let already = app.session().is_authenticated();

    let (identity, warning) = match app.login().await {
        LoginOutcome::Authenticated { identity, warning } => (identity, warning),
        LoginOutcome::Failed(message) => return Err(Error::AuthenticationFailed(message)),
    };

    let header = if already {
        format!("zenith login: already signed in as {}", identity.name)
    } else {
        format!("zenith login: signed in as {}", identity.name)
    };
    let mut human = HumanOutput::new(header);
    describe(&mut human, &identity);
    if let Some(warning) = warning {
        human.push_warning(warning);
    }
    for notice in app.take_warnings() {
        human.push_warning(notice);
    }
    human.push_next_step("zenith task ls");

    emit_success(
        ctx.output,
        "login",
        &SessionReport {
            authenticated: true,
            identity: Some(identity),
        },
        Some(&human),
    )
}

pub fn run_logout(ctx: &Context) -> Result<()> {
    let (_lock, mut app) = ctx.open_app()?;
    let was_signed_in = app.session().is_authenticated();
    let warning = app.logout();

    let mut human = HumanOutput::new(if was_signed_in {
        "zenith logout: signed out"
    } else {
        "zenith logout: not signed in"
    });
    human.push_detail("stored session and tasks cleared");
    if let Some(warning) = warning {
        human.push_warning(warning);
    }

    emit_success(
        ctx.output,
        "logout",
        &SessionReport {
            authenticated: false,
            identity: None,
        },
        Some(&human),
    )
}

pub fn run_whoami(ctx: &Context) -> Result<()> {
    let (_lock, app) = ctx.open_app()?;
    let identity = app.session().identity().cloned();

    let mut human = match identity.as_ref() {
        Some(identity) => {
            let mut human = HumanOutput::new(format!("zenith whoami: {}", identity.name));
            describe(&mut human, identity);
            human
        }
        None => {
            let mut human = HumanOutput::new("zenith whoami: not signed in");
            human.push_next_step("zenith login");
            human
        }
    };
    if let Some(picture) = identity.as_ref().and_then(|identity| identity.picture.clone()) {
        human.push_summary("picture", picture);
    }

    emit_success(
        ctx.output,
        "whoami",
        &SessionReport {
            authenticated: identity.is_some(),
            identity,
        },
        Some(&human),
    )
}
