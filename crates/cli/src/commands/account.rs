//! Account commands: login, registration, logout and the current user.

use std::io::Write;

use secrecy::SecretString;
use the_shop_client::SessionManager;

use crate::error::CliError;
use crate::render;

pub async fn login(
    manager: &mut SessionManager,
    email: &str,
    password: String,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let password = SecretString::from(password);
    manager.login(email, &password).await?;
    match manager.state().display_name() {
        Some(name) => writeln!(out, "Logged in as {name}")?,
        None => writeln!(out, "Logged in")?,
    }
    Ok(())
}

pub async fn register(
    manager: &mut SessionManager,
    email: &str,
    password: String,
    name: Option<&str>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let password = SecretString::from(password);
    let user = manager.register(email, &password, name).await?;
    writeln!(
        out,
        "Registration successful for {}! Please login.",
        user.email
    )?;
    Ok(())
}

pub fn logout(manager: &mut SessionManager, out: &mut impl Write) -> Result<(), CliError> {
    manager.logout();
    writeln!(out, "Logged out")?;
    Ok(())
}

pub async fn whoami(manager: &mut SessionManager, out: &mut impl Write) -> Result<(), CliError> {
    let resolved = manager.resolve_session().await;
    match (manager.state().current_user(), resolved) {
        (Some(user), _) => render::user(out, user)?,
        (None, Err(e)) if manager.state().is_authenticated() => return Err(e.into()),
        (None, Err(_)) => writeln!(out, "Session expired, please login again.")?,
        (None, Ok(())) => writeln!(out, "Not logged in")?,
    }
    Ok(())
}
