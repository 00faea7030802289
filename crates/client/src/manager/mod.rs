//! The client session state manager.
//!
//! [`SessionManager`] owns the [`ShopState`], the [`ApiClient`] and the
//! [`TokenStore`]. Intents take `&mut self`, so state is never mutated
//! concurrently; independent fetches inside one intent run together with
//! `tokio::join!` and are applied in the order they were issued.
//!
//! # Example
//!
//! ```rust,ignore
//! let config = ClientConfig::from_env()?;
//! let tokens = FileTokenStore::new(&config.token_file);
//! let mut manager = SessionManager::new(&config, Box::new(tokens))?;
//!
//! manager.bootstrap().await;
//! manager.add_to_cart(ProductId::new(1))?;
//! let receipt = manager.place_order().await?;
//! ```

mod auth;
mod cart;
mod catalog;
mod profile;
mod reviews;
mod wishlist;

pub use auth::{validate_login, validate_registration};

use secrecy::SecretString;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiError, HealthStatus, User, WishlistResponse};
use crate::config::ClientConfig;
use crate::error::{Action, ActionError, add_breadcrumb, clear_sentry_user, record_failure, set_sentry_user};
use crate::state::ShopState;
use crate::token::TokenStore;

/// Failures collected while bootstrapping.
#[derive(Debug, Default)]
pub struct BootstrapReport {
    /// Fetches that failed. None of them stopped the others.
    pub failures: Vec<ActionError>,
    /// The stored token was rejected and has been discarded.
    pub session_rejected: bool,
}

impl BootstrapReport {
    /// Whether every fetch succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.session_rejected
    }
}

/// Owns all client state and mediates every network interaction.
pub struct SessionManager {
    api: ApiClient,
    tokens: Box<dyn TokenStore>,
    state: ShopState,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("api", &self.api)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a manager for the configured API.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig, tokens: Box<dyn TokenStore>) -> Result<Self, ApiError> {
        let api = ApiClient::new(config)?;
        Ok(Self::with_client(api, tokens, &config.placeholder_image_url))
    }

    /// Create a manager around an existing API client.
    #[must_use]
    pub fn with_client(api: ApiClient, tokens: Box<dyn TokenStore>, placeholder_image: &str) -> Self {
        Self {
            api,
            tokens,
            state: ShopState::new(placeholder_image),
        }
    }

    /// Read-only view of the current state.
    #[must_use]
    pub const fn state(&self) -> &ShopState {
        &self.state
    }

    /// The underlying API client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Load everything a fresh session needs.
    ///
    /// Categories, products and health are fetched concurrently; with a
    /// stored token the current user and the wishlist are fetched alongside.
    /// One failing fetch never blocks the others.
    pub async fn bootstrap(&mut self) -> BootstrapReport {
        add_breadcrumb("session", "Bootstrap", &[]);

        self.restore_session();
        let token = self.token();

        let api = &self.api;
        let (categories, products, health, session) = tokio::join!(
            api.categories(),
            api.products(None),
            api.health(),
            async {
                match &token {
                    Some(token) => Some(tokio::join!(api.current_user(token), api.wishlist(token))),
                    None => None,
                }
            }
        );

        let mut report = BootstrapReport::default();

        match categories {
            Ok(categories) => self.state.catalog.categories = categories,
            Err(e) => report
                .failures
                .push(fail(ActionError::request(Action::FetchCategories, e))),
        }

        if let Err(e) = self.apply_products(products) {
            report.failures.push(e);
        }

        self.apply_health(health);

        if let Some((user, wishlist)) = session {
            match self.apply_session(user) {
                Ok(()) => {
                    if let Err(e) = self.apply_wishlist(wishlist) {
                        report.failures.push(e);
                    }
                }
                Err(e) if !self.state.is_authenticated() => {
                    debug!(error = %e, "Discarding wishlist of rejected session");
                    report.session_rejected = true;
                }
                Err(e) => {
                    report.failures.push(e);
                    if let Err(e) = self.apply_wishlist(wishlist) {
                        report.failures.push(e);
                    }
                }
            }
        }

        info!(
            products = self.state.catalog.products.len(),
            categories = self.state.catalog.categories.len(),
            authenticated = self.state.is_authenticated(),
            failures = report.failures.len(),
            "Session bootstrapped"
        );
        report
    }

    // =========================================================================
    // Result application
    // =========================================================================

    fn apply_health(&mut self, result: Result<HealthStatus, ApiError>) {
        let health = result.unwrap_or_else(|e| {
            warn!(error = %e, "Health check failed");
            HealthStatus::error(Action::Health.fallback_message())
        });
        self.state.health = Some(health);
    }

    /// Apply a `/auth/me` answer. A 401 discards the session.
    fn apply_session(&mut self, result: Result<User, ApiError>) -> Result<(), ActionError> {
        match result {
            Ok(user) => {
                set_sentry_user(&user.id, Some(&user.email));
                debug!(user_id = %user.id, "Session resolved");
                if let Some(session) = self.state.session.as_mut() {
                    session.user = Some(user);
                }
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                info!("Stored token rejected, signing out");
                self.forget_token();
                self.state.clear_session();
                clear_sentry_user();
                Err(fail(ActionError::request(Action::ResolveSession, e)))
            }
            Err(e) => Err(fail(ActionError::request(Action::ResolveSession, e))),
        }
    }

    fn apply_wishlist(
        &mut self,
        result: Result<WishlistResponse, ApiError>,
    ) -> Result<(), ActionError> {
        match result {
            Ok(response) => {
                self.state.wishlist.replace_with(&response);
                Ok(())
            }
            Err(e) => Err(fail(ActionError::request(Action::FetchWishlist, e))),
        }
    }

    // =========================================================================
    // Token handling
    // =========================================================================

    /// The bearer token of the current session.
    fn token(&self) -> Option<SecretString> {
        self.state.session.as_ref().map(|s| s.token.clone())
    }

    /// The bearer token, or open the login prompt and fail.
    fn require_token(&mut self) -> Result<SecretString, ActionError> {
        match self.token() {
            Some(token) => Ok(token),
            None => {
                self.state.prompt_login();
                Err(fail(ActionError::LoginRequired))
            }
        }
    }

    fn load_token(&self) -> Option<SecretString> {
        self.tokens.load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load stored token");
            None
        })
    }

    fn persist_token(&self, token: &SecretString) {
        if let Err(e) = self.tokens.save(token) {
            warn!(error = %e, "Failed to persist token");
        }
    }

    fn forget_token(&self) {
        if let Err(e) = self.tokens.clear() {
            warn!(error = %e, "Failed to clear stored token");
        }
    }
}

/// Log and record a failed intent, handing the error back.
fn fail(error: ActionError) -> ActionError {
    warn!(error = %error, severity = ?error.severity(), "Action failed");
    record_failure(&error);
    error
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::state::Session;
    use crate::token::MemoryTokenStore;

    /// A manager whose API is unreachable; only offline paths may be exercised.
    pub(super) fn offline_manager() -> SessionManager {
        let config = ClientConfig::new("http://127.0.0.1:9/api").unwrap();
        SessionManager::new(&config, Box::new(MemoryTokenStore::new())).unwrap()
    }

    #[test]
    fn test_new_manager_is_anonymous() {
        let manager = offline_manager();
        assert!(!manager.state().is_authenticated());
        assert!(manager.state().cart().is_empty());
        assert_eq!(
            manager.api().base_url().as_str(),
            "http://127.0.0.1:9/api/"
        );
    }

    #[test]
    fn test_require_token_opens_prompt() {
        let mut manager = offline_manager();
        let err = manager.require_token().unwrap_err();
        assert!(matches!(err, ActionError::LoginRequired));
        assert!(manager.state().auth_prompt().is_open());
    }

    #[test]
    fn test_rejected_session_clears_token() {
        let tokens = MemoryTokenStore::with_token("stale");
        let config = ClientConfig::new("http://127.0.0.1:9/api").unwrap();
        let mut manager = SessionManager::new(&config, Box::new(tokens)).unwrap();
        let token = manager.load_token().unwrap();
        manager.state.session = Some(Session::new(token));

        let result = manager.apply_session(Err(ApiError::Status {
            status: 401,
            detail: Some("Could not validate credentials".to_string()),
        }));

        assert!(result.is_err());
        assert!(!manager.state().is_authenticated());
        assert!(manager.load_token().is_none());
    }

    #[test]
    fn test_other_session_failures_keep_token() {
        let tokens = MemoryTokenStore::with_token("good");
        let config = ClientConfig::new("http://127.0.0.1:9/api").unwrap();
        let mut manager = SessionManager::new(&config, Box::new(tokens)).unwrap();
        let token = manager.load_token().unwrap();
        manager.state.session = Some(Session::new(token));

        let result = manager.apply_session(Err(ApiError::Status {
            status: 500,
            detail: None,
        }));

        assert!(result.is_err());
        assert!(manager.state().is_authenticated());
        assert!(manager.load_token().is_some());
    }

    #[test]
    fn test_failed_health_records_error_status() {
        let mut manager = offline_manager();
        manager.apply_health(Err(ApiError::Parse("eof".to_string())));
        let health = manager.state().health().unwrap();
        assert!(!health.is_healthy());
        assert_eq!(health.message.as_deref(), Some("Cannot connect to backend API"));
    }
}
