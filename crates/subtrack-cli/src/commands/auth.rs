//! Auth command handlers

use anyhow::{Context, Result};

use subtrack_core::{AuthClient, RestAuth, SyncClient};

use crate::output::Output;
use crate::prompt::resolve_password;
use crate::session::{Session, SessionStore};

/// Register a new account and sign it in
pub async fn register(
    auth: &AuthClient,
    provider: &RestAuth,
    sessions: &SessionStore,
    email: String,
    password: Option<String>,
    output: &Output,
) -> Result<()> {
    let password = resolve_password(password)?;

    let user = auth
        .register(&email, &password)
        .await
        .context("Registration failed")?;

    sessions.save(&Session::new(&user, provider.token()))?;

    output.success(&format!("Registered and signed in as {}", user.email));
    Ok(())
}

/// Sign in an existing account
pub async fn login(
    auth: &AuthClient,
    provider: &RestAuth,
    sessions: &SessionStore,
    email: String,
    password: Option<String>,
    output: &Output,
) -> Result<()> {
    let password = resolve_password(password)?;

    let user = auth
        .login(&email, &password)
        .await
        .context("Login failed")?;

    sessions.save(&Session::new(&user, provider.token()))?;

    output.success(&format!("Signed in as {}", user.email));
    Ok(())
}

/// Sign out and tear down cached data
pub async fn logout(
    auth: &AuthClient,
    client: &SyncClient,
    sessions: &SessionStore,
    output: &Output,
) -> Result<()> {
    auth.logout().await.context("Logout failed")?;
    sessions.clear()?;

    // Cached data belongs to the signed-in account; drop it with the session
    client.clear().await;

    output.success("Signed out");
    Ok(())
}

/// Show the signed-in account
pub fn whoami(sessions: &SessionStore, output: &Output) -> Result<()> {
    match sessions.load()? {
        Some(session) => output.print_user(&session.user()),
        None => output.message("Not signed in."),
    }
    Ok(())
}
