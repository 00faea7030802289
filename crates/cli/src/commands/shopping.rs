//! Commands that act for the signed-in user.
//!
//! Each one picks up the persisted token first; without one the manager
//! answers with "Please login first".

use std::io::Write;

use the_shop_client::SessionManager;
use the_shop_client::state::Tab;
use the_shop_core::{OrderId, ProductId};

use super::{ItemSpec, WishlistAction};
use crate::error::CliError;
use crate::render;

pub async fn wishlist(
    manager: &mut SessionManager,
    action: Option<WishlistAction>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    manager.restore_session();
    match action {
        None => {
            manager.refresh_wishlist().await?;
            // Titles are a nicety; ids are shown without them
            let _ = manager.filter_catalog(None).await;
            render::wishlist(out, manager.state())?;
        }
        Some(WishlistAction::Toggle { id }) => {
            manager.refresh_wishlist().await?;
            if manager.toggle_wishlist(id).await? {
                writeln!(out, "Added #{id} to your wishlist")?;
            } else {
                writeln!(out, "Removed #{id} from your wishlist")?;
            }
        }
        Some(WishlistAction::Check { id }) => {
            if manager.check_wishlist(id).await? {
                writeln!(out, "#{id} is on your wishlist")?;
            } else {
                writeln!(out, "#{id} is not on your wishlist")?;
            }
        }
    }
    Ok(())
}

pub async fn review(
    manager: &mut SessionManager,
    id: ProductId,
    rating: i64,
    comment: Option<&str>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    manager.restore_session();
    manager.select_product(id).await?;
    manager.set_review_draft(rating, comment)?;
    let review = manager.submit_review().await?;
    writeln!(out, "Review #{} submitted successfully!", review.id)?;

    if let Some(detail) = manager.state().selected_product()
        && let Some(reviews) = detail.reviews()
    {
        writeln!(
            out,
            "{} now has {} review(s), average {:.1}/5",
            detail.product.title, reviews.total_reviews, reviews.average_rating
        )?;
    }
    Ok(())
}

/// Load the catalog, fill the cart from `items` and check out.
pub async fn order(
    manager: &mut SessionManager,
    items: &[ItemSpec],
    out: &mut impl Write,
) -> Result<(), CliError> {
    manager.restore_session();
    manager.filter_catalog(None).await?;
    for item in items {
        manager.add_quantity_to_cart(item.product_id, item.quantity)?;
    }
    render::cart(out, manager.state())?;

    let receipt = manager.place_order().await?;
    writeln!(out, "{receipt}")?;
    Ok(())
}

pub async fn orders(
    manager: &mut SessionManager,
    id: Option<OrderId>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    manager.restore_session();
    if let Some(id) = id {
        let order = manager.fetch_order(id).await?;
        render::order(out, &order)?;
        return Ok(());
    }

    manager.load_profile().await?;
    let profile = manager.state().profile();
    if let Some(error) = profile.orders_error() {
        writeln!(out, "! {error}")?;
    } else if profile.orders().is_empty() {
        writeln!(out, "No orders yet.")?;
    }
    for placed in profile.orders() {
        render::order(out, placed)?;
    }
    Ok(())
}

pub async fn profile(manager: &mut SessionManager, out: &mut impl Write) -> Result<(), CliError> {
    manager.resolve_session().await?;
    manager.select_tab(Tab::Profile).await?;
    render::profile(out, manager.state())?;
    Ok(())
}
