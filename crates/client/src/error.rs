//! Intent-level errors and Sentry helpers.
//!
//! Every [`SessionManager`](crate::manager::SessionManager) intent returns
//! [`ActionError`]. A view shows [`ActionError::user_message`] either next to
//! the affected data or as a blocking notice, depending on
//! [`ActionError::severity`].

use thiserror::Error;

use crate::api::ApiError;

/// The intent that issued a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Health,
    FetchCategories,
    FetchProducts,
    FetchProduct,
    FetchReviews,
    Login,
    Register,
    ResolveSession,
    FetchWishlist,
    UpdateWishlist,
    CheckWishlist,
    SubmitReview,
    UpdateReview,
    DeleteReview,
    PlaceOrder,
    FetchOrders,
    FetchOrder,
    FetchMyReviews,
}

impl Action {
    /// Message shown when the server gave no usable detail.
    #[must_use]
    pub const fn fallback_message(self) -> &'static str {
        match self {
            Self::Health => "Cannot connect to backend API",
            Self::FetchCategories => "Failed to fetch categories",
            Self::FetchProducts => "Failed to fetch products",
            Self::FetchProduct => "Failed to fetch product",
            Self::FetchReviews => "Failed to fetch reviews",
            Self::Login => "Login failed",
            Self::Register => "Registration failed",
            Self::ResolveSession => "Failed to fetch user",
            Self::FetchWishlist => "Failed to fetch wishlist",
            Self::UpdateWishlist => "Failed to update wishlist",
            Self::CheckWishlist => "Failed to check wishlist",
            Self::SubmitReview => "Failed to submit review",
            Self::UpdateReview => "Failed to update review",
            Self::DeleteReview => "Failed to delete review",
            Self::PlaceOrder => "Failed to place order",
            Self::FetchOrders => "Failed to fetch orders",
            Self::FetchOrder => "Failed to fetch order",
            Self::FetchMyReviews => "Failed to fetch your reviews",
        }
    }

    /// Whether a failure of this action blocks the user's flow.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::Login
            | Self::Register
            | Self::UpdateWishlist
            | Self::SubmitReview
            | Self::UpdateReview
            | Self::DeleteReview
            | Self::PlaceOrder => Severity::Blocking,
            Self::Health
            | Self::FetchCategories
            | Self::FetchProducts
            | Self::FetchProduct
            | Self::FetchReviews
            | Self::ResolveSession
            | Self::FetchWishlist
            | Self::CheckWishlist
            | Self::FetchOrders
            | Self::FetchOrder
            | Self::FetchMyReviews => Severity::Inline,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Health => "health check",
            Self::FetchCategories => "fetch categories",
            Self::FetchProducts => "fetch products",
            Self::FetchProduct => "fetch product",
            Self::FetchReviews => "fetch reviews",
            Self::Login => "login",
            Self::Register => "register",
            Self::ResolveSession => "resolve session",
            Self::FetchWishlist => "fetch wishlist",
            Self::UpdateWishlist => "update wishlist",
            Self::CheckWishlist => "check wishlist",
            Self::SubmitReview => "submit review",
            Self::UpdateReview => "update review",
            Self::DeleteReview => "delete review",
            Self::PlaceOrder => "place order",
            Self::FetchOrders => "fetch orders",
            Self::FetchOrder => "fetch order",
            Self::FetchMyReviews => "fetch my reviews",
        };
        f.write_str(name)
    }
}

/// How a failure is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Shown next to the affected data; the view stays usable.
    Inline,
    /// Interrupts the current flow until acknowledged.
    Blocking,
}

/// Errors returned by session manager intents.
#[derive(Debug, Error)]
pub enum ActionError {
    /// A request to the API failed.
    #[error("{action} failed: {source}")]
    Request {
        action: Action,
        #[source]
        source: ApiError,
    },

    /// Checkout with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The intent needs an authenticated session.
    #[error("Please login first")]
    LoginRequired,

    /// Form input rejected before sending.
    #[error("{0}")]
    Invalid(String),
}

impl ActionError {
    pub(crate) const fn request(action: Action, source: ApiError) -> Self {
        Self::Request { action, source }
    }

    /// Text for the user: the server's detail when it sent one, otherwise
    /// a generic message for the action.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Request { action, source } => source
                .detail()
                .map_or_else(|| action.fallback_message().to_string(), str::to_string),
            Self::EmptyCart | Self::LoginRequired | Self::Invalid(_) => self.to_string(),
        }
    }

    /// Inline or blocking presentation.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Request { action, .. } => action.severity(),
            Self::Invalid(_) => Severity::Inline,
            Self::EmptyCart | Self::LoginRequired => Severity::Blocking,
        }
    }

    /// The underlying API error, if any.
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Request { source, .. } => Some(source),
            _ => None,
        }
    }
}

// =============================================================================
// Sentry helpers
// =============================================================================

/// Set the Sentry user for the authenticated session.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user after logout or a rejected token.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Record a user intent as a breadcrumb. No-op when Sentry is not initialized.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}

/// Breadcrumb for a failed intent.
pub(crate) fn record_failure(error: &ActionError) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some("action".to_string()),
        message: Some(error.to_string()),
        level: match error.severity() {
            Severity::Inline => sentry::Level::Warning,
            Severity::Blocking => sentry::Level::Error,
        },
        ..Default::default()
    };
    if let Some(status) = error.api_error().and_then(ApiError::status) {
        breadcrumb
            .data
            .insert("status".to_string(), serde_json::Value::from(status));
    }
    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status(status: u16, detail: Option<&str>) -> ApiError {
        ApiError::Status {
            status,
            detail: detail.map(str::to_string),
        }
    }

    #[test]
    fn test_user_message_prefers_server_detail() {
        let err = ActionError::request(
            Action::Login,
            status(401, Some("Incorrect email or password")),
        );
        assert_eq!(err.user_message(), "Incorrect email or password");
        assert_eq!(err.severity(), Severity::Blocking);
    }

    #[test]
    fn test_user_message_falls_back_to_action() {
        let err = ActionError::request(Action::FetchProducts, status(500, None));
        assert_eq!(err.user_message(), "Failed to fetch products");
        assert_eq!(err.severity(), Severity::Inline);

        let err = ActionError::request(Action::PlaceOrder, ApiError::Parse("eof".to_string()));
        assert_eq!(err.user_message(), "Failed to place order");
        assert_eq!(err.severity(), Severity::Blocking);
    }

    #[test]
    fn test_precondition_messages() {
        assert_eq!(ActionError::EmptyCart.user_message(), "Cart is empty");
        assert_eq!(ActionError::LoginRequired.user_message(), "Please login first");
        assert_eq!(ActionError::LoginRequired.severity(), Severity::Blocking);

        let invalid = ActionError::Invalid("Password must be at least 6 characters".to_string());
        assert_eq!(invalid.user_message(), "Password must be at least 6 characters");
        assert_eq!(invalid.severity(), Severity::Inline);
        assert!(invalid.api_error().is_none());
    }

    #[test]
    fn test_display_names_action() {
        let err = ActionError::request(Action::UpdateWishlist, status(400, Some("Product already in wishlist")));
        assert_eq!(
            err.to_string(),
            "update wishlist failed: API error: 400 - Product already in wishlist"
        );
    }
}
