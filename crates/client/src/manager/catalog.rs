//! Catalog intents: category filter, product details and health.

use the_shop_core::ProductId;
use tracing::debug;

use super::{SessionManager, fail};
use crate::api::{ApiError, Product};
use crate::error::{Action, ActionError, add_breadcrumb};
use crate::state::ProductDetail;

impl SessionManager {
    /// Re-fetch the product list for `category` (`None` for all products).
    ///
    /// Every call issues a fresh request. On failure the previous list is
    /// kept and the catalog error banner is set; success clears the banner.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Request`] if the product list could not be
    /// fetched.
    pub async fn filter_catalog(&mut self, category: Option<&str>) -> Result<(), ActionError> {
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        add_breadcrumb(
            "catalog",
            "Filter products",
            &[("category", category.unwrap_or("all").to_string())],
        );

        self.state.catalog.selected_category = category.map(str::to_string);
        let result = self.api.products(category).await;
        self.apply_products(result)
    }

    /// Reload the category list.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Request`] if the categories could not be
    /// fetched; the previous list is kept.
    pub async fn refresh_categories(&mut self) -> Result<&[String], ActionError> {
        match self.api.categories().await {
            Ok(categories) => {
                self.state.catalog.categories = categories;
                Ok(&self.state.catalog.categories)
            }
            Err(e) => Err(fail(ActionError::request(Action::FetchCategories, e))),
        }
    }

    /// Probe the API again. The result is always recorded in the state.
    pub async fn refresh_health(&mut self) -> bool {
        let result = self.api.health().await;
        self.apply_health(result);
        self.state
            .health
            .as_ref()
            .is_some_and(crate::api::HealthStatus::is_healthy)
    }

    /// Open a product: load its details and aggregated reviews together.
    ///
    /// The review draft is reset. A failed review fetch is shown inline on
    /// the detail view.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Request`] if the product could not be fetched;
    /// the previous selection is kept.
    pub async fn select_product(&mut self, product_id: ProductId) -> Result<(), ActionError> {
        add_breadcrumb(
            "catalog",
            "Viewed product",
            &[("product_id", product_id.to_string())],
        );

        let (product, reviews) = tokio::join!(
            self.api.product(product_id),
            self.api.product_reviews(product_id)
        );

        let product = product.map_err(|e| fail(ActionError::request(Action::FetchProduct, e)))?;
        let (reviews, reviews_error) = match reviews {
            Ok(reviews) => (Some(reviews), None),
            Err(e) => {
                let error = fail(ActionError::request(Action::FetchReviews, e));
                (None, Some(error.user_message()))
            }
        };

        self.state.selected = Some(ProductDetail {
            product,
            reviews,
            reviews_error,
        });
        self.state.review_draft.reset();
        Ok(())
    }

    /// Close the product detail view.
    pub fn clear_selection(&mut self) {
        self.state.selected = None;
        self.state.review_draft.reset();
    }

    /// Apply a product list answer.
    pub(super) fn apply_products(
        &mut self,
        result: Result<Vec<Product>, ApiError>,
    ) -> Result<(), ActionError> {
        match result {
            Ok(products) => {
                debug!(count = products.len(), "Catalog updated");
                self.state.catalog.products = products;
                self.state.catalog.error = None;
                Ok(())
            }
            Err(e) => {
                let error = fail(ActionError::request(Action::FetchProducts, e));
                self.state.catalog.error = Some(error.user_message());
                Err(error)
            }
        }
    }

    /// Re-fetch the aggregated reviews of the selected product.
    pub(super) async fn refresh_selected_reviews(&mut self) {
        let Some(product_id) = self.state.selected.as_ref().map(|d| d.product.id) else {
            return;
        };
        let result = self.api.product_reviews(product_id).await;
        if let Some(detail) = self.state.selected.as_mut() {
            match result {
                Ok(reviews) => {
                    detail.reviews = Some(reviews);
                    detail.reviews_error = None;
                }
                Err(e) => {
                    let error = fail(ActionError::request(Action::FetchReviews, e));
                    detail.reviews_error = Some(error.user_message());
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manager::tests::offline_manager;
    use the_shop_core::Price;

    fn product(id: i64) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Price::from_cents(999),
            description: None,
            category: "electronics".to_string(),
            image: None,
            rating_rate: 0.0,
            rating_count: 0,
            created_at: None,
        }
    }

    #[test]
    fn test_failed_products_keep_previous_list() {
        let mut manager = offline_manager();
        manager.apply_products(Ok(vec![product(1), product(2)])).unwrap();
        assert_eq!(manager.state().catalog().error(), None);

        let err = manager
            .apply_products(Err(ApiError::Status {
                status: 500,
                detail: None,
            }))
            .unwrap_err();

        assert_eq!(err.user_message(), "Failed to fetch products");
        assert_eq!(manager.state().catalog().products().len(), 2);
        assert_eq!(
            manager.state().catalog().error(),
            Some("Failed to fetch products")
        );

        manager.apply_products(Ok(vec![product(3)])).unwrap();
        assert_eq!(manager.state().catalog().error(), None);
        assert_eq!(manager.state().catalog().products().len(), 1);
    }

    #[tokio::test]
    async fn test_filter_records_selected_category() {
        let mut manager = offline_manager();
        // The API is unreachable, so only the recorded filter is checked
        let _ = manager.filter_catalog(Some(" jewelery ")).await;
        assert_eq!(manager.state().catalog().selected_category(), Some("jewelery"));

        let _ = manager.filter_catalog(Some("")).await;
        assert_eq!(manager.state().catalog().selected_category(), None);
    }
}
