//! HTTP implementation of the REST API client.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use the_shop_core::{OrderId, ProductId, ReviewId};
use tracing::{debug, instrument};
use url::Url;

use super::types::{
    HealthStatus, LoginRequest, Order, OrderCreate, Product, ProductReviews, RegisterRequest,
    Review, ReviewCreate, ReviewUpdate, TokenResponse, User, WishlistAddRequest, WishlistCheck,
    WishlistItem, WishlistResponse,
};
use super::{ApiError, parse_error_detail};
use crate::config::ClientConfig;

/// Maximum number of body characters included in error logs.
const LOG_BODY_LIMIT: usize = 500;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Online Store REST API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("the-shop-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_base_url.clone(),
            }),
        })
    }

    /// The API base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolve an endpoint path relative to the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Start a request, attaching the bearer token when given.
    fn request(
        &self,
        method: Method,
        url: Url,
        token: Option<&SecretString>,
    ) -> RequestBuilder {
        let builder = self.inner.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    /// Send a request and decode a JSON body.
    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = checked(request.send().await?).await?;
        let body = response.text().await?;

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %truncate(&body),
                "Failed to parse API response"
            );
            ApiError::Parse(e.to_string())
        })
    }

    /// Send a request whose success response has no body of interest.
    async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
        checked(request.send().await?).await?;
        Ok(())
    }

    // =========================================================================
    // Health & Catalog
    // =========================================================================

    /// Probe API health.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API is not healthy enough
    /// to answer.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        let url = self.endpoint("health")?;
        self.send_json(self.request(Method::GET, url, None)).await
    }

    /// List product categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Vec<String>, ApiError> {
        let url = self.endpoint("products/categories")?;
        self.send_json(self.request(Method::GET, url, None)).await
    }

    /// List products, optionally filtered by category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, category: Option<&str>) -> Result<Vec<Product>, ApiError> {
        let mut url = self.endpoint("products/")?;
        if let Some(category) = category {
            url.query_pairs_mut().append_pair("category", category);
        }
        let products: Vec<Product> = self.send_json(self.request(Method::GET, url, None)).await?;
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product, ApiError> {
        let url = self.endpoint(&format!("products/{id}"))?;
        self.send_json(self.request(Method::GET, url, None)).await
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip_all, fields(email = %body.email))]
    pub async fn login(&self, body: &LoginRequest<'_>) -> Result<TokenResponse, ApiError> {
        let url = self.endpoint("auth/login/json")?;
        self.send_json(self.request(Method::POST, url, None).json(body))
            .await
    }

    /// Register a new account. Does not log in.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is taken, input is invalid, or the
    /// request fails.
    #[instrument(skip_all, fields(email = %body.email))]
    pub async fn register(&self, body: &RegisterRequest<'_>) -> Result<User, ApiError> {
        let url = self.endpoint("auth/register")?;
        self.send_json(self.request(Method::POST, url, None).json(body))
            .await
    }

    /// Fetch the profile the token belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with status 401 if the token is invalid.
    #[instrument(skip_all)]
    pub async fn current_user(&self, token: &SecretString) -> Result<User, ApiError> {
        let url = self.endpoint("auth/me")?;
        self.send_json(self.request(Method::GET, url, Some(token)))
            .await
    }

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Fetch the user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn wishlist(&self, token: &SecretString) -> Result<WishlistResponse, ApiError> {
        let url = self.endpoint("wishlist")?;
        self.send_json(self.request(Method::GET, url, Some(token)))
            .await
    }

    /// Add a product to the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is unknown, already listed, or the
    /// request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_to_wishlist(
        &self,
        token: &SecretString,
        product_id: ProductId,
    ) -> Result<WishlistItem, ApiError> {
        let url = self.endpoint("wishlist")?;
        let body = WishlistAddRequest { product_id };
        self.send_json(self.request(Method::POST, url, Some(token)).json(&body))
            .await
    }

    /// Remove a product from the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not listed or the request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn remove_from_wishlist(
        &self,
        token: &SecretString,
        product_id: ProductId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("wishlist/{product_id}"))?;
        self.send_empty(self.request(Method::DELETE, url, Some(token)))
            .await
    }

    /// Ask the server whether a product is on the wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn wishlist_contains(
        &self,
        token: &SecretString,
        product_id: ProductId,
    ) -> Result<bool, ApiError> {
        let url = self.endpoint(&format!("wishlist/check/{product_id}"))?;
        let check: WishlistCheck = self
            .send_json(self.request(Method::GET, url, Some(token)))
            .await?;
        Ok(check.in_wishlist)
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Fetch the aggregated reviews of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product_reviews(&self, product_id: ProductId) -> Result<ProductReviews, ApiError> {
        let url = self.endpoint(&format!("reviews/product/{product_id}"))?;
        self.send_json(self.request(Method::GET, url, None)).await
    }

    /// Submit a review.
    ///
    /// # Errors
    ///
    /// Returns an error if the user already reviewed the product, input is
    /// invalid, or the request fails.
    #[instrument(skip(self, token, body), fields(product_id = %body.product_id))]
    pub async fn submit_review(
        &self,
        token: &SecretString,
        body: &ReviewCreate<'_>,
    ) -> Result<Review, ApiError> {
        let url = self.endpoint("reviews")?;
        self.send_json(self.request(Method::POST, url, Some(token)).json(body))
            .await
    }

    /// Update one of the user's reviews.
    ///
    /// # Errors
    ///
    /// Returns an error if the review is missing, not the user's, or the
    /// request fails.
    #[instrument(skip(self, token, body), fields(review_id = %review_id))]
    pub async fn update_review(
        &self,
        token: &SecretString,
        review_id: ReviewId,
        body: &ReviewUpdate<'_>,
    ) -> Result<Review, ApiError> {
        let url = self.endpoint(&format!("reviews/{review_id}"))?;
        self.send_json(self.request(Method::PUT, url, Some(token)).json(body))
            .await
    }

    /// Delete one of the user's reviews.
    ///
    /// # Errors
    ///
    /// Returns an error if the review is missing, not the user's, or the
    /// request fails.
    #[instrument(skip(self, token), fields(review_id = %review_id))]
    pub async fn delete_review(
        &self,
        token: &SecretString,
        review_id: ReviewId,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("reviews/{review_id}"))?;
        self.send_empty(self.request(Method::DELETE, url, Some(token)))
            .await
    }

    /// Fetch the reviews written by the current user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn my_reviews(&self, token: &SecretString) -> Result<Vec<Review>, ApiError> {
        let url = self.endpoint("reviews/user/me")?;
        self.send_json(self.request(Method::GET, url, Some(token)))
            .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Place an order.
    ///
    /// # Errors
    ///
    /// Returns an error if a product is unknown, the order is empty, or the
    /// request fails.
    #[instrument(skip(self, token, body), fields(lines = body.items.len()))]
    pub async fn place_order(
        &self,
        token: &SecretString,
        body: &OrderCreate,
    ) -> Result<Order, ApiError> {
        let url = self.endpoint("orders/")?;
        self.send_json(self.request(Method::POST, url, Some(token)).json(body))
            .await
    }

    /// List the user's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn orders(&self, token: &SecretString) -> Result<Vec<Order>, ApiError> {
        let url = self.endpoint("orders/")?;
        self.send_json(self.request(Method::GET, url, Some(token)))
            .await
    }

    /// Fetch one of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns an error if the order is missing, not the user's, or the
    /// request fails.
    #[instrument(skip(self, token), fields(order_id = %order_id))]
    pub async fn order(&self, token: &SecretString, order_id: OrderId) -> Result<Order, ApiError> {
        let url = self.endpoint(&format!("orders/{order_id}"))?;
        self.send_json(self.request(Method::GET, url, Some(token)))
            .await
    }
}

// =============================================================================
// Response helpers
// =============================================================================

/// Turn a non-success response into [`ApiError::Status`].
async fn checked(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = parse_error_detail(&body);

    // 401 on /auth/me is routine for expired tokens; callers decide how loud to be.
    if status == reqwest::StatusCode::UNAUTHORIZED {
        debug!(status = %status, detail = ?detail, "API rejected credentials");
    } else {
        tracing::error!(
            status = %status,
            body = %truncate(&body),
            "API returned non-success status"
        );
    }

    Err(ApiError::Status {
        status: status.as_u16(),
        detail,
    })
}

fn truncate(body: &str) -> String {
    body.chars().take(LOG_BODY_LIMIT).collect()
}
