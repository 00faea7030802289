//! Wire types for the Online Store REST API.
//!
//! Response types mirror the API's JSON schemas. Request bodies borrow from
//! the caller so secrets are only exposed for the duration of serialization.

use serde::{Deserialize, Serialize};
use the_shop_core::{
    OrderId, OrderItemId, OrderStatus, Price, ProductId, Rating, ReviewId, UserId, WishlistItemId,
};

// =============================================================================
// Health
// =============================================================================

/// Result of the `/health` probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `healthy` when the API is up.
    pub status: String,
    /// Service name reported by the API.
    #[serde(default)]
    pub service: Option<String>,
    /// Failure description when the probe itself failed.
    #[serde(default)]
    pub message: Option<String>,
}

impl HealthStatus {
    /// Probe result recorded when the request failed.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            service: None,
            message: Some(message.into()),
        }
    }

    /// Whether the API reported itself healthy.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

// =============================================================================
// Products
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Price,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Average rating.
    #[serde(default)]
    pub rating_rate: f64,
    /// Number of ratings.
    #[serde(default)]
    pub rating_count: i64,
    #[serde(default)]
    pub created_at: Option<String>,
}

fn default_category() -> String {
    "general".to_string()
}

impl Product {
    /// The product image, or `placeholder` when it has none.
    #[must_use]
    pub fn image_or<'a>(&'a self, placeholder: &'a str) -> &'a str {
        self.image
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(placeholder)
    }
}

// =============================================================================
// Auth
// =============================================================================

/// Body of `POST /auth/login/json`.
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: Option<&'a str>,
}

/// Token issued on login.
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// A user profile as returned by `/auth/me` and `/auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

const fn default_true() -> bool {
    true
}

impl User {
    /// Name to show in the header: the user's name, or their email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

// =============================================================================
// Wishlist
// =============================================================================

/// Body of `POST /wishlist`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WishlistAddRequest {
    pub product_id: ProductId,
}

/// A wishlist row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistItem {
    #[serde(default)]
    pub id: Option<WishlistItemId>,
    pub product_id: ProductId,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Response of `GET /wishlist`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistResponse {
    pub items: Vec<WishlistItem>,
    #[serde(default)]
    pub count: Option<usize>,
}

/// Response of `GET /wishlist/check/{id}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WishlistCheck {
    pub in_wishlist: bool,
}

// =============================================================================
// Reviews
// =============================================================================

/// Body of `POST /reviews`.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewCreate<'a> {
    pub product_id: ProductId,
    pub rating: Rating,
    pub comment: Option<&'a str>,
}

/// Body of `PUT /reviews/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewUpdate<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<&'a str>,
}

/// A product review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub user_id: UserId,
    pub product_id: ProductId,
    pub rating: Rating,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Aggregated reviews of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductReviews {
    pub product_id: ProductId,
    pub average_rating: f64,
    pub total_reviews: u32,
    pub reviews: Vec<Review>,
}

// =============================================================================
// Orders
// =============================================================================

/// One line of an order request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Body of `POST /orders/`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCreate {
    pub items: Vec<OrderItemRequest>,
}

/// One line of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price at the time of purchase.
    pub price: Price,
    #[serde(default)]
    pub product: Option<Product>,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    #[serde(default)]
    pub status: OrderStatus,
    pub total: Price,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_from_api_json() {
        let json = r#"{
            "id": 3,
            "title": "Mens Cotton Jacket",
            "price": 55.99,
            "description": null,
            "category": "men's clothing",
            "image": null,
            "rating_rate": 4.7,
            "rating_count": 500,
            "created_at": "2024-01-01T12:00:00"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(3));
        assert_eq!(product.price, Price::from_cents(5599));
        assert_eq!(product.image_or("placeholder.png"), "placeholder.png");
    }

    #[test]
    fn test_user_display_name_falls_back_to_email() {
        let mut user = User {
            id: UserId::new(1),
            email: "ada@example.com".to_string(),
            name: None,
            is_active: true,
            created_at: None,
        };
        assert_eq!(user.display_name(), "ada@example.com");
        user.name = Some("Ada".to_string());
        assert_eq!(user.display_name(), "Ada");
    }

    #[test]
    fn test_review_update_skips_absent_fields() {
        let update = ReviewUpdate {
            rating: Some(Rating::new(3).unwrap()),
            comment: None,
        };
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"rating":3}"#);
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc.def.ghi"}"#).unwrap();
        let debug = format!("{token:?}");
        assert!(!debug.contains("abc.def.ghi"));
        assert_eq!(token.token_type, "bearer");
    }
}
