//! In-process mock of the Online Store REST API.
//!
//! [`MockShopApi`] serves the same endpoints, JSON shapes and error bodies
//! (`{"detail": ...}`) as the real API from an axum router bound to
//! `127.0.0.1:0`. Tests point a [`SessionManager`] at it and inspect both
//! sides afterwards.
//!
//! # Usage
//!
//! ```rust,ignore
//! let api = MockShopApi::start().await;
//! let mut manager = api.manager();
//!
//! manager.bootstrap().await;
//! assert_eq!(api.request_count(), 3);
//! ```
//!
//! The mock counts every request it receives, so tests can assert that an
//! intent failed before touching the network, and can inject failures into
//! individual endpoints.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use the_shop_client::api::{Order, OrderItem, Product, ProductReviews, Review, User, WishlistItem};
use the_shop_client::{ClientConfig, MemoryTokenStore, SessionManager, TokenStore};
use the_shop_core::{
    OrderId, OrderItemId, OrderStatus, Price, ProductId, Rating, ReviewId, UserId, WishlistItemId,
};
use tokio::task::JoinHandle;

const TIMESTAMP: &str = "2024-01-01T00:00:00";

// =============================================================================
// Mock data
// =============================================================================

struct MockUser {
    user: User,
    password: String,
}

struct MockData {
    products: Vec<Product>,
    users: Vec<MockUser>,
    tokens: HashMap<String, UserId>,
    wishlist: Vec<(UserId, WishlistItem)>,
    reviews: Vec<Review>,
    orders: Vec<Order>,
    next_id: i64,
}

impl MockData {
    fn seeded() -> Self {
        let products = [
            (1, "Fjallraven Foldsack No. 1 Backpack", 10995, "men's clothing", true),
            (2, "Mens Casual Premium Slim Fit T-Shirts", 2230, "men's clothing", true),
            (3, "John Hardy Women's Legends Naga Bracelet", 69500, "jewelery", true),
            (4, "WD 2TB Elements Portable External Hard Drive", 6400, "electronics", true),
            (5, "Rain Jacket Women Windbreaker", 3999, "women's clothing", false),
        ]
        .into_iter()
        .map(|(id, title, cents, category, has_image)| Product {
            id: ProductId::new(id),
            title: title.to_string(),
            price: Price::from_cents(cents),
            description: Some(format!("{title} description")),
            category: category.to_string(),
            image: has_image.then(|| format!("https://images.test/{id}.jpg")),
            rating_rate: 3.9,
            rating_count: 120,
            created_at: Some(TIMESTAMP.to_string()),
        })
        .collect();

        Self {
            products,
            users: Vec::new(),
            tokens: HashMap::new(),
            wishlist: Vec::new(),
            reviews: Vec::new(),
            orders: Vec::new(),
            next_id: 100,
        }
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    fn user_by_email(&self, email: &str) -> Option<&MockUser> {
        self.users
            .iter()
            .find(|u| u.user.email.eq_ignore_ascii_case(email))
    }

    fn create_user(&mut self, email: &str, password: &str, name: Option<&str>) -> User {
        let user = User {
            id: UserId::new(self.next_id()),
            email: email.to_string(),
            name: name.map(str::to_string),
            is_active: true,
            created_at: Some(TIMESTAMP.to_string()),
        };
        self.users.push(MockUser {
            user: user.clone(),
            password: password.to_string(),
        });
        user
    }

    fn issue_token(&mut self, user_id: UserId) -> String {
        let token = format!("token-{}", self.next_id());
        self.tokens.insert(token.clone(), user_id);
        token
    }

    fn wishlist_items(&self, user_id: UserId) -> Vec<WishlistItem> {
        self.wishlist
            .iter()
            .filter(|(owner, _)| *owner == user_id)
            .map(|(_, item)| item.clone())
            .collect()
    }
}

// =============================================================================
// Server state
// =============================================================================

#[derive(Default)]
struct Failures {
    products: AtomicBool,
    wishlist_add: AtomicBool,
    wishlist_remove: AtomicBool,
    orders: AtomicBool,
}

struct MockState {
    data: Mutex<MockData>,
    requests: AtomicUsize,
    failures: Failures,
}

impl MockState {
    fn data(&self) -> MutexGuard<'_, MockData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type Shared = Arc<MockState>;
type ApiResult<T> = Result<T, Response>;

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn validation(field: &str, message: &str) -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(json!({
            "detail": [{ "loc": ["body", field], "msg": message, "type": "value_error" }]
        })),
    )
        .into_response()
}

fn unauthorized() -> Response {
    detail(StatusCode::UNAUTHORIZED, "Could not validate credentials")
}

fn authenticate(data: &MockData, headers: &HeaderMap) -> ApiResult<UserId> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(unauthorized)?;
    data.tokens.get(token).copied().ok_or_else(unauthorized)
}

async fn count_requests(State(state): State<Shared>, request: Request, next: Next) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    next.run(request).await
}

// =============================================================================
// Catalog handlers
// =============================================================================

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": "online-store-api" }))
}

async fn categories(State(state): State<Shared>) -> Json<Vec<String>> {
    let data = state.data();
    let mut categories: Vec<String> = data.products.iter().map(|p| p.category.clone()).collect();
    categories.sort();
    categories.dedup();
    Json(categories)
}

#[derive(Deserialize)]
struct ProductQuery {
    category: Option<String>,
}

async fn products(
    State(state): State<Shared>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    if state.failures.products.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
    }
    let data = state.data();
    let products = data
        .products
        .iter()
        .filter(|p| query.category.as_deref().is_none_or(|c| p.category == c))
        .cloned()
        .collect();
    Ok(Json(products))
}

async fn product(State(state): State<Shared>, Path(id): Path<i64>) -> ApiResult<Json<Product>> {
    state
        .data()
        .product(ProductId::new(id))
        .cloned()
        .map(Json)
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Product not found"))
}

// =============================================================================
// Auth handlers
// =============================================================================

#[derive(Deserialize)]
struct RegisterBody {
    email: String,
    password: String,
    name: Option<String>,
}

async fn register(
    State(state): State<Shared>,
    Json(body): Json<RegisterBody>,
) -> ApiResult<(StatusCode, Json<User>)> {
    if body.password.chars().count() < 6 {
        return Err(validation("password", "String should have at least 6 characters"));
    }
    let mut data = state.data();
    if data.user_by_email(&body.email).is_some() {
        return Err(detail(StatusCode::BAD_REQUEST, "Email already registered"));
    }
    let user = data.create_user(&body.email, &body.password, body.name.as_deref());
    Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(
    State(state): State<Shared>,
    Json(body): Json<LoginBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let mut data = state.data();
    let user_id = data
        .user_by_email(&body.email)
        .filter(|u| u.password == body.password)
        .map(|u| u.user.id)
        .ok_or_else(|| detail(StatusCode::UNAUTHORIZED, "Incorrect email or password"))?;
    let token = data.issue_token(user_id);
    Ok(Json(json!({ "access_token": token, "token_type": "bearer" })))
}

async fn me(State(state): State<Shared>, headers: HeaderMap) -> ApiResult<Json<User>> {
    let data = state.data();
    let user_id = authenticate(&data, &headers)?;
    data.users
        .iter()
        .find(|u| u.user.id == user_id)
        .map(|u| Json(u.user.clone()))
        .ok_or_else(unauthorized)
}

// =============================================================================
// Wishlist handlers
// =============================================================================

async fn wishlist(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> ApiResult<Json<serde_json::Value>> {
    let data = state.data();
    let user_id = authenticate(&data, &headers)?;
    let items = data.wishlist_items(user_id);
    Ok(Json(json!({ "count": items.len(), "items": items })))
}

#[derive(Deserialize)]
struct WishlistBody {
    product_id: i64,
}

async fn add_to_wishlist(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<WishlistBody>,
) -> ApiResult<(StatusCode, Json<WishlistItem>)> {
    let mut data = state.data();
    let user_id = authenticate(&data, &headers)?;
    if state.failures.wishlist_add.load(Ordering::SeqCst) {
        return Err(StatusCode::SERVICE_UNAVAILABLE.into_response());
    }
    let product_id = ProductId::new(body.product_id);
    if data.product(product_id).is_none() {
        return Err(detail(StatusCode::NOT_FOUND, "Product not found"));
    }
    if data
        .wishlist
        .iter()
        .any(|(owner, item)| *owner == user_id && item.product_id == product_id)
    {
        return Err(detail(StatusCode::BAD_REQUEST, "Product already in wishlist"));
    }
    let item = WishlistItem {
        id: Some(WishlistItemId::new(data.next_id())),
        product_id,
        created_at: Some(TIMESTAMP.to_string()),
    };
    data.wishlist.push((user_id, item.clone()));
    Ok((StatusCode::CREATED, Json(item)))
}

async fn remove_from_wishlist(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(product_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let mut data = state.data();
    let user_id = authenticate(&data, &headers)?;
    if state.failures.wishlist_remove.load(Ordering::SeqCst) {
        return Err(StatusCode::SERVICE_UNAVAILABLE.into_response());
    }
    let product_id = ProductId::new(product_id);
    let before = data.wishlist.len();
    data.wishlist
        .retain(|(owner, item)| !(*owner == user_id && item.product_id == product_id));
    if data.wishlist.len() == before {
        return Err(detail(StatusCode::NOT_FOUND, "Product not in wishlist"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn check_wishlist(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(product_id): Path<i64>,
) -> ApiResult<Json<serde_json::Value>> {
    let data = state.data();
    let user_id = authenticate(&data, &headers)?;
    let product_id = ProductId::new(product_id);
    let listed = data
        .wishlist
        .iter()
        .any(|(owner, item)| *owner == user_id && item.product_id == product_id);
    Ok(Json(json!({ "product_id": product_id, "in_wishlist": listed })))
}

// =============================================================================
// Review handlers
// =============================================================================

async fn product_reviews(
    State(state): State<Shared>,
    Path(product_id): Path<i64>,
) -> ApiResult<Json<ProductReviews>> {
    let data = state.data();
    let product_id = ProductId::new(product_id);
    if data.product(product_id).is_none() {
        return Err(detail(StatusCode::NOT_FOUND, "Product not found"));
    }
    let reviews: Vec<Review> = data
        .reviews
        .iter()
        .filter(|r| r.product_id == product_id)
        .cloned()
        .collect();
    let total = u32::try_from(reviews.len()).unwrap_or(u32::MAX);
    let sum: u32 = reviews.iter().map(|r| u32::from(r.rating.stars())).sum();
    let average = if total == 0 {
        0.0
    } else {
        (f64::from(sum) / f64::from(total) * 10.0).round() / 10.0
    };
    Ok(Json(ProductReviews {
        product_id,
        average_rating: average,
        total_reviews: total,
        reviews,
    }))
}

#[derive(Deserialize)]
struct ReviewBody {
    product_id: i64,
    rating: i64,
    comment: Option<String>,
}

async fn submit_review(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ReviewBody>,
) -> ApiResult<(StatusCode, Json<Review>)> {
    let mut data = state.data();
    let user_id = authenticate(&data, &headers)?;
    let rating = Rating::new(body.rating)
        .map_err(|_| validation("rating", "Input should be less than or equal to 5"))?;
    let product_id = ProductId::new(body.product_id);
    if data.product(product_id).is_none() {
        return Err(detail(StatusCode::NOT_FOUND, "Product not found"));
    }
    if data
        .reviews
        .iter()
        .any(|r| r.user_id == user_id && r.product_id == product_id)
    {
        return Err(detail(
            StatusCode::BAD_REQUEST,
            "You have already reviewed this product. Use PUT to update.",
        ));
    }
    let review = Review {
        id: ReviewId::new(data.next_id()),
        user_id,
        product_id,
        rating,
        comment: body.comment,
        created_at: Some(TIMESTAMP.to_string()),
        updated_at: None,
    };
    data.reviews.push(review.clone());
    Ok((StatusCode::CREATED, Json(review)))
}

#[derive(Deserialize)]
struct ReviewPatch {
    rating: Option<i64>,
    comment: Option<String>,
}

fn own_review<'a>(
    data: &'a mut MockData,
    user_id: UserId,
    review_id: i64,
    verb: &str,
) -> ApiResult<&'a mut Review> {
    let review = data
        .reviews
        .iter_mut()
        .find(|r| r.id == ReviewId::new(review_id))
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Review not found"))?;
    if review.user_id != user_id {
        return Err(detail(
            StatusCode::FORBIDDEN,
            &format!("You can only {verb} your own reviews"),
        ));
    }
    Ok(review)
}

async fn update_review(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(review_id): Path<i64>,
    Json(body): Json<ReviewPatch>,
) -> ApiResult<Json<Review>> {
    let mut data = state.data();
    let user_id = authenticate(&data, &headers)?;
    let rating = body
        .rating
        .map(Rating::new)
        .transpose()
        .map_err(|_| validation("rating", "Input should be less than or equal to 5"))?;
    let review = own_review(&mut data, user_id, review_id, "edit")?;
    if let Some(rating) = rating {
        review.rating = rating;
    }
    if let Some(comment) = body.comment {
        review.comment = Some(comment);
    }
    review.updated_at = Some(TIMESTAMP.to_string());
    Ok(Json(review.clone()))
}

async fn delete_review(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(review_id): Path<i64>,
) -> ApiResult<StatusCode> {
    let mut data = state.data();
    let user_id = authenticate(&data, &headers)?;
    own_review(&mut data, user_id, review_id, "delete")?;
    data.reviews.retain(|r| r.id != ReviewId::new(review_id));
    Ok(StatusCode::NO_CONTENT)
}

async fn my_reviews(State(state): State<Shared>, headers: HeaderMap) -> ApiResult<Json<Vec<Review>>> {
    let data = state.data();
    let user_id = authenticate(&data, &headers)?;
    Ok(Json(
        data.reviews
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect(),
    ))
}

// =============================================================================
// Order handlers
// =============================================================================

#[derive(Deserialize)]
struct OrderLine {
    product_id: i64,
    quantity: i64,
}

#[derive(Deserialize)]
struct OrderBody {
    items: Vec<OrderLine>,
}

async fn place_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<OrderBody>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    let mut data = state.data();
    let user_id = authenticate(&data, &headers)?;
    if state.failures.orders.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
    }
    if body.items.is_empty() {
        return Err(detail(StatusCode::BAD_REQUEST, "Order must have at least one item"));
    }

    let mut items = Vec::with_capacity(body.items.len());
    for line in &body.items {
        let quantity = u32::try_from(line.quantity)
            .ok()
            .filter(|q| *q > 0)
            .ok_or_else(|| validation("quantity", "Input should be greater than 0"))?;
        let product = data
            .product(ProductId::new(line.product_id))
            .cloned()
            .ok_or_else(|| {
                detail(
                    StatusCode::NOT_FOUND,
                    &format!("Product {} not found", line.product_id),
                )
            })?;
        items.push((product, quantity));
    }

    let order_id = OrderId::new(data.next_id());
    let items: Vec<OrderItem> = items
        .into_iter()
        .map(|(product, quantity)| OrderItem {
            id: OrderItemId::new(data.next_id()),
            product_id: product.id,
            quantity,
            price: product.price,
            product: Some(product),
        })
        .collect();
    let order = Order {
        id: order_id,
        user_id,
        status: OrderStatus::Pending,
        total: items.iter().map(|i| i.price.times(i.quantity)).sum(),
        created_at: Some(TIMESTAMP.to_string()),
        items,
    };
    data.orders.push(order.clone());
    Ok((StatusCode::CREATED, Json(order)))
}

async fn orders(State(state): State<Shared>, headers: HeaderMap) -> ApiResult<Json<Vec<Order>>> {
    let data = state.data();
    let user_id = authenticate(&data, &headers)?;
    Ok(Json(
        data.orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect(),
    ))
}

async fn order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(order_id): Path<i64>,
) -> ApiResult<Json<Order>> {
    let data = state.data();
    let user_id = authenticate(&data, &headers)?;
    data.orders
        .iter()
        .find(|o| o.id == OrderId::new(order_id) && o.user_id == user_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| detail(StatusCode::NOT_FOUND, "Order not found"))
}

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/products/categories", get(categories))
        .route("/products/", get(products))
        .route("/products/{id}", get(product))
        .route("/auth/register", post(register))
        .route("/auth/login/json", post(login))
        .route("/auth/me", get(me))
        .route("/wishlist", get(wishlist).post(add_to_wishlist))
        .route("/wishlist/{product_id}", delete(remove_from_wishlist))
        .route("/wishlist/check/{product_id}", get(check_wishlist))
        .route("/reviews", post(submit_review))
        .route("/reviews/{id}", delete(delete_review).put(update_review))
        .route("/reviews/product/{product_id}", get(product_reviews))
        .route("/reviews/user/me", get(my_reviews))
        .route("/orders/", get(orders).post(place_order))
        .route("/orders/{id}", get(order));

    Router::new()
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(state.clone(), count_requests))
        .with_state(state)
}

// =============================================================================
// MockShopApi
// =============================================================================

/// A running mock API. The server stops when this is dropped.
pub struct MockShopApi {
    state: Shared,
    addr: SocketAddr,
    server: JoinHandle<()>,
}

impl MockShopApi {
    /// Start a mock API with the seeded catalog and no users.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state = Arc::new(MockState {
            data: Mutex::new(MockData::seeded()),
            requests: AtomicUsize::new(0),
            failures: Failures::default(),
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock API");
        let addr = listener.local_addr().expect("Mock API has no local address");

        let app = router(Arc::clone(&state));
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            state,
            addr,
            server,
        }
    }

    /// API base URL including the `/api` prefix.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Client configuration pointing at this mock.
    ///
    /// # Panics
    ///
    /// Panics if the base URL is rejected, which would be a bug in the mock.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url()).expect("Mock base URL is valid")
    }

    /// A manager with an empty in-memory token store.
    #[must_use]
    pub fn manager(&self) -> SessionManager {
        self.manager_with(Box::new(MemoryTokenStore::new()))
    }

    /// A manager using the given token store.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn manager_with(&self, tokens: Box<dyn TokenStore>) -> SessionManager {
        SessionManager::new(&self.config(), tokens).expect("Failed to build session manager")
    }

    /// Number of requests served so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    /// Create a user directly, bypassing the API.
    pub fn add_user(&self, email: &str, password: &str, name: Option<&str>) -> User {
        self.state.data().create_user(email, password, name)
    }

    /// Issue a valid token for an existing user.
    ///
    /// # Panics
    ///
    /// Panics if no user has this email.
    #[must_use]
    pub fn token_for(&self, email: &str) -> String {
        let mut data = self.state.data();
        let user_id = data.user_by_email(email).expect("Unknown user").user.id;
        data.issue_token(user_id)
    }

    /// Invalidate every issued token, as after a server-side logout.
    pub fn revoke_tokens(&self) {
        self.state.data().tokens.clear();
    }

    /// Product ids on a user's wishlist, as the server sees it.
    ///
    /// # Panics
    ///
    /// Panics if no user has this email.
    #[must_use]
    pub fn wishlist_of(&self, email: &str) -> Vec<ProductId> {
        let data = self.state.data();
        let user_id = data.user_by_email(email).expect("Unknown user").user.id;
        data.wishlist_items(user_id)
            .into_iter()
            .map(|item| item.product_id)
            .collect()
    }

    /// Put a product on a user's wishlist directly, as another device would.
    ///
    /// # Panics
    ///
    /// Panics if no user has this email.
    pub fn add_to_wishlist_of(&self, email: &str, product_id: ProductId) {
        let mut data = self.state.data();
        let user_id = data.user_by_email(email).expect("Unknown user").user.id;
        let item = WishlistItem {
            id: Some(WishlistItemId::new(data.next_id())),
            product_id,
            created_at: Some(TIMESTAMP.to_string()),
        };
        data.wishlist.push((user_id, item));
    }

    /// Number of orders placed on the server.
    #[must_use]
    pub fn order_count(&self) -> usize {
        self.state.data().orders.len()
    }

    /// Make `GET /products/` answer 500 while set.
    pub fn fail_products(&self, fail: bool) {
        self.state.failures.products.store(fail, Ordering::SeqCst);
    }

    /// Make `POST /wishlist` answer 503 while set.
    pub fn fail_wishlist_add(&self, fail: bool) {
        self.state.failures.wishlist_add.store(fail, Ordering::SeqCst);
    }

    /// Make `DELETE /wishlist/{id}` answer 503 while set.
    pub fn fail_wishlist_remove(&self, fail: bool) {
        self.state.failures.wishlist_remove.store(fail, Ordering::SeqCst);
    }

    /// Make `POST /orders/` answer 500 while set.
    pub fn fail_orders(&self, fail: bool) {
        self.state.failures.orders.store(fail, Ordering::SeqCst);
    }
}

impl Drop for MockShopApi {
    fn drop(&mut self) {
        self.server.abort();
    }
}
