//! Catalog commands. None of them need a session.

use std::io::Write;

use the_shop_client::SessionManager;
use the_shop_core::ProductId;

use crate::error::CliError;
use crate::render;

pub async fn health(manager: &mut SessionManager, out: &mut impl Write) -> Result<(), CliError> {
    let healthy = manager.refresh_health().await;
    if let Some(health) = manager.state().health() {
        render::health(out, health)?;
    }
    if !healthy {
        tracing::warn!(base_url = %manager.api().base_url(), "API is not healthy");
    }
    Ok(())
}

pub async fn categories(
    manager: &mut SessionManager,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let categories = manager.refresh_categories().await?;
    render::categories(out, categories)?;
    Ok(())
}

/// List products. A failed fetch is shown as the inline banner, not an error.
pub async fn products(
    manager: &mut SessionManager,
    category: Option<&str>,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let _ = manager.filter_catalog(category).await;
    render::catalog(out, manager.state())?;
    Ok(())
}

pub async fn product(
    manager: &mut SessionManager,
    id: ProductId,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if manager.restore_session() {
        // Only to mark wishlisted products; failures are not fatal here
        let _ = manager.refresh_wishlist().await;
    }
    manager.select_product(id).await?;
    if let Some(detail) = manager.state().selected_product() {
        render::product_detail(out, manager.state(), detail)?;
    }
    Ok(())
}
