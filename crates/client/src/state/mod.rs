//! View state owned by the session manager.
//!
//! [`ShopState`] is the single state object of a session. Views read it
//! through `&ShopState`; every mutation goes through a
//! [`SessionManager`](crate::manager::SessionManager) intent, which is why
//! the fields are only writable inside this crate.

pub mod cart;
pub mod review;
pub mod wishlist;

pub use cart::{Cart, CartLine};
pub use review::ReviewDraft;
pub use wishlist::{PendingChange, Wishlist};

use secrecy::SecretString;
use the_shop_core::{OrderId, Price, ProductId};

use crate::api::{HealthStatus, Order, Product, ProductReviews, Review, User};

/// Top-level view tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Products,
    Cart,
    Wishlist,
    Profile,
}

/// Which form the auth prompt shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

/// Login/register prompt state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthPrompt {
    pub(crate) open: bool,
    pub(crate) mode: AuthMode,
    pub(crate) error: Option<String>,
}

impl AuthPrompt {
    /// Whether the prompt is showing.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.open
    }

    /// Current form.
    #[must_use]
    pub const fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Error shown inside the prompt.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// An authenticated session.
pub struct Session {
    pub(crate) token: SecretString,
    pub(crate) user: Option<User>,
}

impl Session {
    pub(crate) const fn new(token: SecretString) -> Self {
        Self { token, user: None }
    }

    /// The resolved profile, once `/auth/me` has answered.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// Catalog as last fetched.
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    pub(crate) products: Vec<Product>,
    pub(crate) categories: Vec<String>,
    pub(crate) selected_category: Option<String>,
    pub(crate) error: Option<String>,
}

impl CatalogState {
    /// Products of the current filter.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// All known categories.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// The active category filter; `None` means all products.
    #[must_use]
    pub fn selected_category(&self) -> Option<&str> {
        self.selected_category.as_deref()
    }

    /// Inline error banner for the last failed fetch.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

/// The product opened for details and reviews.
#[derive(Debug, Clone)]
pub struct ProductDetail {
    pub product: Product,
    pub(crate) reviews: Option<ProductReviews>,
    pub(crate) reviews_error: Option<String>,
}

impl ProductDetail {
    /// Aggregated reviews, once loaded.
    #[must_use]
    pub const fn reviews(&self) -> Option<&ProductReviews> {
        self.reviews.as_ref()
    }

    /// Inline error from the last review fetch.
    #[must_use]
    pub fn reviews_error(&self) -> Option<&str> {
        self.reviews_error.as_deref()
    }
}

/// Data shown on the profile tab.
#[derive(Debug, Clone, Default)]
pub struct ProfileData {
    pub(crate) orders: Vec<Order>,
    pub(crate) reviews: Vec<Review>,
    pub(crate) orders_error: Option<String>,
    pub(crate) reviews_error: Option<String>,
}

impl ProfileData {
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    #[must_use]
    pub fn orders_error(&self) -> Option<&str> {
        self.orders_error.as_deref()
    }

    #[must_use]
    pub fn reviews_error(&self) -> Option<&str> {
        self.reviews_error.as_deref()
    }
}

/// Confirmation of a placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub total: Price,
}

impl std::fmt::Display for OrderReceipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Order #{} placed successfully! Total: {}",
            self.order_id, self.total
        )
    }
}

/// All state of one storefront session.
#[derive(Debug, Default)]
pub struct ShopState {
    pub(crate) catalog: CatalogState,
    pub(crate) cart: Cart,
    pub(crate) wishlist: Wishlist,
    pub(crate) session: Option<Session>,
    pub(crate) tab: Tab,
    pub(crate) health: Option<HealthStatus>,
    pub(crate) auth_prompt: AuthPrompt,
    pub(crate) selected: Option<ProductDetail>,
    pub(crate) review_draft: ReviewDraft,
    pub(crate) profile: ProfileData,
    pub(crate) last_order: Option<OrderReceipt>,
    pub(crate) placeholder_image: String,
}

impl ShopState {
    pub(crate) fn new(placeholder_image: impl Into<String>) -> Self {
        Self {
            placeholder_image: placeholder_image.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub const fn wishlist(&self) -> &Wishlist {
        &self.wishlist
    }

    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn tab(&self) -> Tab {
        self.tab
    }

    #[must_use]
    pub const fn health(&self) -> Option<&HealthStatus> {
        self.health.as_ref()
    }

    #[must_use]
    pub const fn auth_prompt(&self) -> &AuthPrompt {
        &self.auth_prompt
    }

    #[must_use]
    pub const fn selected_product(&self) -> Option<&ProductDetail> {
        self.selected.as_ref()
    }

    #[must_use]
    pub const fn review_draft(&self) -> &ReviewDraft {
        &self.review_draft
    }

    #[must_use]
    pub const fn profile(&self) -> &ProfileData {
        &self.profile
    }

    #[must_use]
    pub const fn last_order(&self) -> Option<OrderReceipt> {
        self.last_order
    }

    // =========================================================================
    // Projections
    // =========================================================================

    /// Whether a bearer token is held.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    /// The resolved user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref().and_then(Session::user)
    }

    /// Header label: the user's name or email, when resolved.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.current_user().map(User::display_name)
    }

    /// Cart total.
    #[must_use]
    pub fn cart_total(&self) -> Price {
        self.cart.total()
    }

    /// Whether `product_id` is on the wishlist.
    #[must_use]
    pub fn in_wishlist(&self, product_id: ProductId) -> bool {
        self.wishlist.contains(product_id)
    }

    /// The product's image, or the configured placeholder.
    #[must_use]
    pub fn product_image<'a>(&'a self, product: &'a Product) -> &'a str {
        product.image_or(&self.placeholder_image)
    }

    /// Look a product up in the loaded catalog or the selected detail view.
    #[must_use]
    pub fn find_product(&self, product_id: ProductId) -> Option<&Product> {
        self.catalog
            .products
            .iter()
            .find(|p| p.id == product_id)
            .or_else(|| {
                self.selected
                    .as_ref()
                    .map(|detail| &detail.product)
                    .filter(|p| p.id == product_id)
            })
    }

    /// Drop everything tied to the authenticated user.
    pub(crate) fn clear_session(&mut self) {
        self.session = None;
        self.wishlist.clear();
        self.profile = ProfileData::default();
        self.last_order = None;
        if self.tab == Tab::Profile {
            self.tab = Tab::Products;
        }
    }

    /// Open the auth prompt in login mode.
    pub(crate) fn prompt_login(&mut self) {
        self.auth_prompt.open = true;
        self.auth_prompt.mode = AuthMode::Login;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use the_shop_core::UserId;

    fn product(id: i64, image: Option<&str>) -> Product {
        Product {
            id: ProductId::new(id),
            title: "Backpack".to_string(),
            price: Price::from_cents(10995),
            description: None,
            category: "men's clothing".to_string(),
            image: image.map(str::to_string),
            rating_rate: 3.9,
            rating_count: 120,
            created_at: None,
        }
    }

    #[test]
    fn test_product_image_placeholder() {
        let state = ShopState::new("https://placeholder.test/150");
        let without = product(1, None);
        let blank = product(2, Some(""));
        let with = product(3, Some("https://cdn.test/3.png"));

        assert_eq!(state.product_image(&without), "https://placeholder.test/150");
        assert_eq!(state.product_image(&blank), "https://placeholder.test/150");
        assert_eq!(state.product_image(&with), "https://cdn.test/3.png");
    }

    #[test]
    fn test_clear_session_resets_user_data() {
        let mut state = ShopState::new("p");
        let mut session = Session::new(SecretString::from("tok"));
        session.user = Some(User {
            id: UserId::new(1),
            email: "a@b.co".to_string(),
            name: None,
            is_active: true,
            created_at: None,
        });
        state.session = Some(session);
        state.wishlist.set_member(ProductId::new(1), true);
        state.tab = Tab::Profile;
        state.cart.add(&product(1, None));
        state.last_order = Some(OrderReceipt {
            order_id: OrderId::new(7),
            total: Price::from_cents(999),
        });

        assert_eq!(state.display_name(), Some("a@b.co"));
        state.clear_session();

        assert!(!state.is_authenticated());
        assert!(state.current_user().is_none());
        assert!(state.wishlist().is_empty());
        assert_eq!(state.last_order(), None);
        assert_eq!(state.tab(), Tab::Products);
        // The cart is not tied to the user
        assert_eq!(state.cart().len(), 1);
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let session = Session::new(SecretString::from("very-secret-token"));
        assert!(!format!("{session:?}").contains("very-secret-token"));
    }

    #[test]
    fn test_receipt_display() {
        let receipt = OrderReceipt {
            order_id: OrderId::new(12),
            total: Price::from_cents(2550),
        };
        assert_eq!(
            receipt.to_string(),
            "Order #12 placed successfully! Total: $25.50"
        );
    }
}
