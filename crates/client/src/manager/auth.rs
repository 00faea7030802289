//! Authentication intents: login, registration, logout and the auth prompt.

use secrecy::{ExposeSecret, SecretString};
use the_shop_core::Email;
use tracing::{debug, info};

use super::{SessionManager, fail};
use crate::api::{LoginRequest, RegisterRequest, User};
use crate::error::{Action, ActionError, add_breadcrumb, clear_sentry_user};
use crate::state::{AuthMode, Session};

const MIN_PASSWORD_LEN: usize = 6;
const MAX_PASSWORD_LEN: usize = 100;
const MAX_NAME_LEN: usize = 200;

/// Check login input before sending it.
///
/// # Errors
///
/// Returns [`ActionError::Invalid`] for a malformed email or a password
/// outside 6-100 characters.
pub fn validate_login(email: &str, password: &SecretString) -> Result<Email, ActionError> {
    let email: Email = email
        .parse()
        .map_err(|e| ActionError::Invalid(format!("Invalid email: {e}")))?;

    let len = password.expose_secret().chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(ActionError::Invalid(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(ActionError::Invalid(format!(
            "Password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(email)
}

/// Check registration input before sending it. A blank name counts as absent.
///
/// # Errors
///
/// Returns [`ActionError::Invalid`] if the login checks fail or the name is
/// longer than 200 characters.
pub fn validate_registration<'a>(
    email: &str,
    password: &SecretString,
    name: Option<&'a str>,
) -> Result<(Email, Option<&'a str>), ActionError> {
    let email = validate_login(email, password)?;
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    if name.is_some_and(|n| n.chars().count() > MAX_NAME_LEN) {
        return Err(ActionError::Invalid(format!(
            "Name must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok((email, name))
}

impl SessionManager {
    // =========================================================================
    // Auth prompt
    // =========================================================================

    /// Show the auth prompt in the given mode.
    pub fn open_auth_prompt(&mut self, mode: AuthMode) {
        let prompt = &mut self.state.auth_prompt;
        prompt.open = true;
        prompt.mode = mode;
        prompt.error = None;
    }

    /// Hide the auth prompt.
    pub fn close_auth_prompt(&mut self) {
        self.state.auth_prompt.open = false;
        self.state.auth_prompt.error = None;
    }

    /// Flip between login and registration.
    pub fn switch_auth_mode(&mut self) {
        let prompt = &mut self.state.auth_prompt;
        prompt.mode = match prompt.mode {
            AuthMode::Login => AuthMode::Register,
            AuthMode::Register => AuthMode::Login,
        };
        prompt.error = None;
    }

    fn prompt_error(&mut self, error: ActionError) -> ActionError {
        self.state.auth_prompt.error = Some(error.user_message());
        fail(error)
    }

    // =========================================================================
    // Login / register / logout
    // =========================================================================

    /// Log in and load the user's session.
    ///
    /// On success any previous session's user data is dropped, the token is
    /// stored and persisted, the prompt closes, and the profile and wishlist
    /// are fetched. On failure the server's message
    /// is shown in the prompt and existing state is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Invalid`] for bad input and
    /// [`ActionError::Request`] when the server rejects the login.
    pub async fn login(&mut self, email: &str, password: &SecretString) -> Result<(), ActionError> {
        add_breadcrumb("auth", "Login", &[]);

        let email = validate_login(email, password).map_err(|e| self.prompt_error(e))?;
        let body = LoginRequest {
            email: email.as_str(),
            password: password.expose_secret(),
        };

        let response = match self.api.login(&body).await {
            Ok(response) => response,
            Err(e) => return Err(self.prompt_error(ActionError::request(Action::Login, e))),
        };

        let token = SecretString::from(response.access_token);
        self.persist_token(&token);
        if self.state.is_authenticated() {
            debug!("Replacing the previous session");
            self.state.clear_session();
        }
        self.state.session = Some(Session::new(token.clone()));
        self.close_auth_prompt();
        info!(email = %email, "Logged in");

        let (user, wishlist) =
            tokio::join!(self.api.current_user(&token), self.api.wishlist(&token));
        self.apply_session(user)?;
        // Best effort; the wishlist can be refreshed later
        let _ = self.apply_wishlist(wishlist);
        Ok(())
    }

    /// Register a new account. Does not log in; the prompt switches to login.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Invalid`] for bad input and
    /// [`ActionError::Request`] when the server rejects the registration
    /// (for example "Email already registered").
    pub async fn register(
        &mut self,
        email: &str,
        password: &SecretString,
        name: Option<&str>,
    ) -> Result<User, ActionError> {
        add_breadcrumb("auth", "Register", &[]);

        let (email, name) =
            validate_registration(email, password, name).map_err(|e| self.prompt_error(e))?;
        let body = RegisterRequest {
            email: email.as_str(),
            password: password.expose_secret(),
            name,
        };

        match self.api.register(&body).await {
            Ok(user) => {
                info!(user_id = %user.id, "Registered");
                self.state.auth_prompt.mode = AuthMode::Login;
                self.state.auth_prompt.error = None;
                Ok(user)
            }
            Err(e) => Err(self.prompt_error(ActionError::request(Action::Register, e))),
        }
    }

    /// Forget the token, the user and everything tied to them.
    pub fn logout(&mut self) {
        add_breadcrumb("auth", "Logout", &[]);
        self.forget_token();
        self.state.clear_session();
        clear_sentry_user();
        info!("Logged out");
    }

    /// Pick up a persisted token without contacting the server.
    ///
    /// Returns whether a session is held afterwards.
    pub fn restore_session(&mut self) -> bool {
        if self.state.session.is_none()
            && let Some(token) = self.load_token()
        {
            self.state.session = Some(Session::new(token));
        }
        self.state.is_authenticated()
    }

    /// Re-resolve the current user from the stored token.
    ///
    /// Without a token this is a no-op. A 401 discards the token and
    /// returns to anonymous state; other failures leave the session as is.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Request`] if the profile could not be fetched.
    pub async fn resolve_session(&mut self) -> Result<(), ActionError> {
        self.restore_session();
        let Some(token) = self.token() else {
            return Ok(());
        };
        let result = self.api.current_user(&token).await;
        self.apply_session(result)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manager::tests::offline_manager;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s)
    }

    #[test]
    fn test_validate_login() {
        assert!(validate_login("a@example.com", &secret("secret1")).is_ok());

        let err = validate_login("not-an-email", &secret("secret1")).unwrap_err();
        assert!(err.user_message().starts_with("Invalid email"));

        let err = validate_login("a@example.com", &secret("12345")).unwrap_err();
        assert_eq!(err.user_message(), "Password must be at least 6 characters");

        let long = "x".repeat(101);
        let err = validate_login("a@example.com", &secret(&long)).unwrap_err();
        assert_eq!(err.user_message(), "Password must be at most 100 characters");
    }

    #[test]
    fn test_validate_registration_name() {
        let (_, name) =
            validate_registration("a@example.com", &secret("secret1"), Some("  ")).unwrap();
        assert_eq!(name, None);

        let (_, name) =
            validate_registration("a@example.com", &secret("secret1"), Some(" Ada ")).unwrap();
        assert_eq!(name, Some("Ada"));

        let long = "n".repeat(201);
        assert!(validate_registration("a@example.com", &secret("secret1"), Some(&long)).is_err());
    }

    #[tokio::test]
    async fn test_invalid_login_sets_prompt_error_without_request() {
        let mut manager = offline_manager();
        manager.open_auth_prompt(AuthMode::Login);

        let err = manager.login("bad", &secret("secret1")).await.unwrap_err();

        assert!(matches!(err, ActionError::Invalid(_)));
        assert!(manager.state().auth_prompt().is_open());
        assert!(manager.state().auth_prompt().error().is_some());
        assert!(!manager.state().is_authenticated());
    }

    #[test]
    fn test_switch_mode_clears_error() {
        let mut manager = offline_manager();
        manager.open_auth_prompt(AuthMode::Login);
        manager.state.auth_prompt.error = Some("Incorrect email or password".to_string());

        manager.switch_auth_mode();

        assert_eq!(manager.state().auth_prompt().mode(), AuthMode::Register);
        assert_eq!(manager.state().auth_prompt().error(), None);

        manager.close_auth_prompt();
        assert!(!manager.state().auth_prompt().is_open());
    }

    #[tokio::test]
    async fn test_resolve_without_token_is_noop() {
        let mut manager = offline_manager();
        manager.resolve_session().await.unwrap();
        assert!(!manager.state().is_authenticated());
    }

    #[test]
    fn test_restore_session_from_store() {
        let config = crate::config::ClientConfig::new("http://127.0.0.1:9/api").unwrap();
        let tokens = crate::token::MemoryTokenStore::with_token("kept");
        let mut manager = SessionManager::new(&config, Box::new(tokens)).unwrap();

        assert!(manager.restore_session());
        assert!(manager.state().is_authenticated());
        // The user is unknown until the server answers
        assert!(manager.state().current_user().is_none());

        manager.logout();
        assert!(!manager.restore_session());
    }

    #[test]
    fn test_logout_is_idempotent() {
        let mut manager = offline_manager();
        manager.logout();
        manager.logout();
        assert!(!manager.state().is_authenticated());
    }
}
