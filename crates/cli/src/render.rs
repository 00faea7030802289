//! Plain-text rendering of client state.

use std::io::{self, Write};

use the_shop_client::ShopState;
use the_shop_client::api::{HealthStatus, Order, Product, ProductReviews, Review, User};
use the_shop_client::state::{PendingChange, ProductDetail};
use the_shop_core::Rating;

fn stars(rating: Rating) -> String {
    let filled = usize::from(rating.stars());
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

/// One-line session summary.
pub fn header(out: &mut impl Write, state: &ShopState) -> io::Result<()> {
    let user = match (state.display_name(), state.is_authenticated()) {
        (Some(name), _) => name.to_string(),
        (None, true) => "signed in".to_string(),
        (None, false) => "guest".to_string(),
    };
    let api = state
        .health()
        .map_or("unknown", |h| if h.is_healthy() { "online" } else { "offline" });
    writeln!(
        out,
        "The Shop | {user} | cart: {} items ({}) | wishlist: {} | API: {api}",
        state.cart().item_count(),
        state.cart_total(),
        state.wishlist().len(),
    )
}

pub fn health(out: &mut impl Write, health: &HealthStatus) -> io::Result<()> {
    match (&health.service, &health.message) {
        (_, Some(message)) => writeln!(out, "{}: {message}", health.status),
        (Some(service), None) => writeln!(out, "{}: {service}", health.status),
        (None, None) => writeln!(out, "{}", health.status),
    }
}

pub fn categories(out: &mut impl Write, categories: &[String]) -> io::Result<()> {
    if categories.is_empty() {
        return writeln!(out, "No categories.");
    }
    for category in categories {
        writeln!(out, "{category}")?;
    }
    Ok(())
}

fn product_line(out: &mut impl Write, state: &ShopState, product: &Product) -> io::Result<()> {
    let marker = match state.wishlist().pending(product.id) {
        Some(PendingChange::Add) => " (adding…)",
        Some(PendingChange::Remove) => " (removing…)",
        None if state.in_wishlist(product.id) => " ♥",
        None => "",
    };
    writeln!(
        out,
        "#{:<4} {:<40} {:>10}  [{}]  {:.1} ({}){marker}",
        product.id.as_i64(),
        product.title,
        product.price.display(),
        product.category,
        product.rating_rate,
        product.rating_count,
    )
}

/// The catalog for the current filter, with the inline error banner.
pub fn catalog(out: &mut impl Write, state: &ShopState) -> io::Result<()> {
    let catalog = state.catalog();
    if let Some(error) = catalog.error() {
        writeln!(out, "! {error}")?;
    }
    if let Some(category) = catalog.selected_category() {
        writeln!(out, "Category: {category}")?;
    }
    if catalog.products().is_empty() {
        return writeln!(out, "No products found.");
    }
    for product in catalog.products() {
        product_line(out, state, product)?;
    }
    Ok(())
}

fn review_line(out: &mut impl Write, review: &Review) -> io::Result<()> {
    write!(out, "  {} by user {}", stars(review.rating), review.user_id)?;
    match review.comment.as_deref().filter(|c| !c.is_empty()) {
        Some(comment) => writeln!(out, ": {comment}"),
        None => writeln!(out),
    }
}

fn review_summary(out: &mut impl Write, reviews: &ProductReviews) -> io::Result<()> {
    if reviews.total_reviews == 0 {
        return writeln!(out, "No reviews yet.");
    }
    writeln!(
        out,
        "Reviews: {:.1}/5 from {} review(s)",
        reviews.average_rating, reviews.total_reviews
    )?;
    for review in &reviews.reviews {
        review_line(out, review)?;
    }
    Ok(())
}

pub fn product_detail(
    out: &mut impl Write,
    state: &ShopState,
    detail: &ProductDetail,
) -> io::Result<()> {
    let product = &detail.product;
    writeln!(out, "{} (#{})", product.title, product.id)?;
    writeln!(out, "Price:    {}", product.price)?;
    writeln!(out, "Category: {}", product.category)?;
    writeln!(out, "Image:    {}", state.product_image(product))?;
    if let Some(description) = product.description.as_deref() {
        writeln!(out, "\n{description}\n")?;
    }
    if state.in_wishlist(product.id) {
        writeln!(out, "♥ On your wishlist")?;
    }
    if let Some(error) = detail.reviews_error() {
        writeln!(out, "! {error}")?;
    }
    if let Some(reviews) = detail.reviews() {
        review_summary(out, reviews)?;
    }
    Ok(())
}

pub fn cart(out: &mut impl Write, state: &ShopState) -> io::Result<()> {
    let cart = state.cart();
    if cart.is_empty() {
        return writeln!(out, "Your cart is empty.");
    }
    for line in cart.lines() {
        writeln!(
            out,
            "#{:<4} {:<40} {:>3} × {:>10} = {:>10}",
            line.product.id.as_i64(),
            line.product.title,
            line.quantity(),
            line.product.price.display(),
            line.line_total().display(),
        )?;
    }
    writeln!(out, "Items: {}  Total: {}", cart.item_count(), cart.total())
}

pub fn wishlist(out: &mut impl Write, state: &ShopState) -> io::Result<()> {
    if state.wishlist().is_empty() {
        return writeln!(out, "Your wishlist is empty.");
    }
    for product_id in state.wishlist().iter() {
        match state.find_product(product_id) {
            Some(product) => product_line(out, state, product)?,
            None => writeln!(out, "#{product_id}")?,
        }
    }
    Ok(())
}

pub fn user(out: &mut impl Write, user: &User) -> io::Result<()> {
    writeln!(out, "{} <{}> (user #{})", user.display_name(), user.email, user.id)
}

pub fn order(out: &mut impl Write, order: &Order) -> io::Result<()> {
    writeln!(
        out,
        "Order #{}  {}  {}  {}",
        order.id,
        order.status,
        order.total,
        order.created_at.as_deref().unwrap_or("-"),
    )?;
    for item in &order.items {
        let title = item
            .product
            .as_ref()
            .map_or_else(|| format!("Product #{}", item.product_id), |p| p.title.clone());
        writeln!(out, "  {:>3} × {title} @ {}", item.quantity, item.price)?;
    }
    Ok(())
}

/// The profile tab: user, orders and own reviews with inline errors.
pub fn profile(out: &mut impl Write, state: &ShopState) -> io::Result<()> {
    if let Some(user) = state.current_user() {
        self::user(out, user)?;
    }
    let profile = state.profile();

    writeln!(out, "\nOrders")?;
    if let Some(error) = profile.orders_error() {
        writeln!(out, "! {error}")?;
    } else if profile.orders().is_empty() {
        writeln!(out, "No orders yet.")?;
    }
    for placed in profile.orders() {
        order(out, placed)?;
    }

    writeln!(out, "\nReviews")?;
    if let Some(error) = profile.reviews_error() {
        writeln!(out, "! {error}")?;
    } else if profile.reviews().is_empty() {
        writeln!(out, "No reviews yet.")?;
    }
    for review in profile.reviews() {
        write!(out, "#{} product #{}", review.id, review.product_id)?;
        review_line(out, review)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_stars() {
        assert_eq!(stars(Rating::new(3).unwrap()), "★★★☆☆");
        assert_eq!(stars(Rating::default()), "★★★★★");
    }

    #[test]
    fn test_empty_cart() {
        let state = ShopState::default();
        let mut out = Vec::new();
        cart(&mut out, &state).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Your cart is empty.\n");
    }

    #[test]
    fn test_guest_header() {
        let state = ShopState::default();
        let mut out = Vec::new();
        header(&mut out, &state).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("guest"));
        assert!(text.contains("$0.00"));
    }
}
