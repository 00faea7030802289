//! Cart intents and checkout.
//!
//! Cart changes never touch the network. Checkout checks its preconditions
//! (non-empty cart, then a session) before issuing any request.

use the_shop_core::ProductId;
use tracing::info;

use super::{SessionManager, fail};
use crate::api::OrderCreate;
use crate::error::{Action, ActionError, add_breadcrumb};
use crate::state::OrderReceipt;

impl SessionManager {
    /// Add one unit of a loaded product to the cart.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Invalid`] if the product is not in the loaded
    /// catalog or the open detail view.
    pub fn add_to_cart(&mut self, product_id: ProductId) -> Result<u32, ActionError> {
        self.add_quantity_to_cart(product_id, 1)
    }

    /// Add `quantity` units of a loaded product, returning the line's new
    /// quantity.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Invalid`] if the product is not loaded or the
    /// quantity is zero.
    pub fn add_quantity_to_cart(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<u32, ActionError> {
        if quantity == 0 {
            return Err(ActionError::Invalid("Quantity must be at least 1".to_string()));
        }
        let product = self
            .state
            .find_product(product_id)
            .cloned()
            .ok_or_else(|| ActionError::Invalid(format!("Product {product_id} not found")))?;

        self.state.cart.add_quantity(&product, quantity);
        Ok(self
            .state
            .cart
            .line(product_id)
            .map_or(0, crate::state::CartLine::quantity))
    }

    /// Drop a product's line. Returns whether a line was removed.
    pub fn remove_from_cart(&mut self, product_id: ProductId) -> bool {
        self.state.cart.remove(product_id)
    }

    /// Change a line's quantity by `delta`. A result below 1 removes the line.
    ///
    /// Returns the new quantity, or `None` if the product has no line.
    pub fn adjust_quantity(&mut self, product_id: ProductId, delta: i64) -> Option<u32> {
        self.state.cart.adjust(product_id, delta)
    }

    /// Submit the cart as an order.
    ///
    /// On success the cart is cleared and the receipt recorded. On failure
    /// the cart is left intact.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::EmptyCart`] or [`ActionError::LoginRequired`]
    /// without any request, and [`ActionError::Request`] if the server
    /// rejects the order.
    pub async fn place_order(&mut self) -> Result<OrderReceipt, ActionError> {
        if self.state.cart.is_empty() {
            return Err(fail(ActionError::EmptyCart));
        }
        let token = self.require_token()?;

        let body = OrderCreate {
            items: self.state.cart.order_items(),
        };
        add_breadcrumb(
            "checkout",
            "Place order",
            &[("lines", body.items.len().to_string())],
        );

        match self.api.place_order(&token, &body).await {
            Ok(order) => {
                let receipt = OrderReceipt {
                    order_id: order.id,
                    total: order.total,
                };
                info!(order_id = %order.id, total = %order.total, "Order placed");
                self.state.cart.clear();
                self.state.last_order = Some(receipt);
                Ok(receipt)
            }
            Err(e) => Err(fail(ActionError::request(Action::PlaceOrder, e))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::Product;
    use crate::manager::tests::offline_manager;
    use the_shop_core::Price;

    fn loaded_manager() -> SessionManager {
        let mut manager = offline_manager();
        manager
            .apply_products(Ok(vec![Product {
                id: ProductId::new(1),
                title: "Mug".to_string(),
                price: Price::from_cents(1000),
                description: None,
                category: "home".to_string(),
                image: None,
                rating_rate: 0.0,
                rating_count: 0,
                created_at: None,
            }]))
            .unwrap();
        manager
    }

    #[tokio::test]
    async fn test_empty_cart_order_fails_first() {
        let mut manager = offline_manager();
        let err = manager.place_order().await.unwrap_err();
        assert!(matches!(err, ActionError::EmptyCart));
        // Empty cart is checked before the session
        assert!(!manager.state().auth_prompt().is_open());
    }

    #[tokio::test]
    async fn test_anonymous_order_opens_prompt() {
        let mut manager = loaded_manager();
        manager.add_to_cart(ProductId::new(1)).unwrap();

        let err = manager.place_order().await.unwrap_err();

        assert!(matches!(err, ActionError::LoginRequired));
        assert!(manager.state().auth_prompt().is_open());
        assert_eq!(manager.state().cart().len(), 1);
    }

    #[test]
    fn test_cart_intents() {
        let mut manager = loaded_manager();
        let id = ProductId::new(1);

        assert_eq!(manager.add_to_cart(id).unwrap(), 1);
        assert_eq!(manager.add_quantity_to_cart(id, 2).unwrap(), 3);
        assert_eq!(manager.state().cart_total(), Price::from_cents(3000));
        assert_eq!(manager.adjust_quantity(id, -3), None);
        assert!(manager.state().cart().is_empty());
        assert!(!manager.remove_from_cart(id));
    }

    #[test]
    fn test_add_unknown_product() {
        let mut manager = loaded_manager();
        let err = manager.add_to_cart(ProductId::new(42)).unwrap_err();
        assert_eq!(err.user_message(), "Product 42 not found");
        assert!(manager.add_quantity_to_cart(ProductId::new(1), 0).is_err());
    }
}
