//! In-memory shopping cart.
//!
//! Lines are unique by product id and kept in insertion order. A line's
//! quantity is always at least 1: any change that would take it lower
//! removes the line instead.

use the_shop_core::{Price, ProductId};

use crate::api::{OrderItemRequest, Product};

/// One cart line: a product snapshot and how many of it.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product: Product,
    quantity: u32,
}

impl CartLine {
    /// Quantity of this line (always >= 1).
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }
}

/// The shopping cart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add one unit of `product`.
    pub fn add(&mut self, product: &Product) {
        self.add_quantity(product, 1);
    }

    /// Add `quantity` units of `product`, merging with an existing line.
    ///
    /// Adding zero units is a no-op.
    pub fn add_quantity(&mut self, product: &Product, quantity: u32) {
        if quantity == 0 {
            return;
        }
        if let Some(line) = self.line_mut(product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(CartLine {
                product: product.clone(),
                quantity,
            });
        }
    }

    /// Remove the line for `product_id`. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product.id != product_id);
        self.lines.len() != before
    }

    /// Change a line's quantity by `delta`.
    ///
    /// A resulting quantity below 1 removes the line. Unknown products are
    /// ignored. Returns the new quantity, or `None` if no line remains.
    pub fn adjust(&mut self, product_id: ProductId, delta: i64) -> Option<u32> {
        let line = self.line_mut(product_id)?;
        let next = i64::from(line.quantity).saturating_add(delta);
        if next < 1 {
            self.remove(product_id);
            return None;
        }
        let quantity = u32::try_from(next).unwrap_or(u32::MAX);
        line.quantity = quantity;
        Some(quantity)
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `product_id`, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product.id == product_id)
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product.id == product_id)
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Sum of price × quantity over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Order request lines for the current contents.
    #[must_use]
    pub fn order_items(&self) -> Vec<OrderItemRequest> {
        self.lines
            .iter()
            .map(|line| OrderItemRequest {
                product_id: line.product.id,
                quantity: line.quantity,
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i64, cents: u32) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Price::from_cents(cents),
            description: None,
            category: "general".to_string(),
            image: None,
            rating_rate: 0.0,
            rating_count: 0,
            created_at: None,
        }
    }

    #[test]
    fn test_adding_twice_merges_lines() {
        let mut cart = Cart::new();
        let p = product(1, 1000);
        cart.add(&p);
        cart.add(&p);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.line(p.id).unwrap().quantity(), 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_total_example() {
        let mut cart = Cart::new();
        cart.add_quantity(&product(1, 1000), 2);
        cart.add(&product(2, 550));

        assert_eq!(cart.total(), Price::from_cents(2550));
        assert_eq!(cart.total().display(), "$25.50");
    }

    #[test]
    fn test_total_matches_sum_for_many_compositions() {
        let unit_cents = [199_u32, 398, 597, 796, 995, 1194];
        let catalog: Vec<Product> = (1_i64..)
            .zip(unit_cents)
            .map(|(id, cents)| product(id, cents))
            .collect();

        for mask in 0u32..64 {
            let mut cart = Cart::new();
            let mut expected_cents = 0u32;
            for ((p, cents), qty) in catalog.iter().zip(unit_cents).zip(1_u32..) {
                if mask & (1 << (qty - 1)) != 0 {
                    cart.add_quantity(p, qty);
                    expected_cents += cents * qty;
                }
            }
            assert_eq!(cart.total(), Price::from_cents(expected_cents), "mask {mask}");
        }
    }

    #[test]
    fn test_decrement_to_zero_removes_line() {
        let mut cart = Cart::new();
        let p = product(1, 500);
        cart.add_quantity(&p, 2);

        assert_eq!(cart.adjust(p.id, -1), Some(1));
        assert_eq!(cart.adjust(p.id, -1), None);
        assert!(cart.is_empty());
        // Nothing left to go below zero
        assert_eq!(cart.adjust(p.id, -1), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_large_negative_delta_removes_line() {
        let mut cart = Cart::new();
        let p = product(1, 500);
        cart.add(&p);
        assert_eq!(cart.adjust(p.id, -10), None);
        assert!(cart.line(p.id).is_none());
    }

    #[test]
    fn test_increment() {
        let mut cart = Cart::new();
        let p = product(4, 100);
        cart.add(&p);
        assert_eq!(cart.adjust(p.id, 3), Some(4));
        assert_eq!(cart.total(), Price::from_cents(400));
    }

    #[test]
    fn test_adjust_unknown_product_is_noop() {
        let mut cart = Cart::new();
        cart.add(&product(1, 100));
        assert_eq!(cart.adjust(ProductId::new(99), 1), None);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut cart = Cart::new();
        cart.add(&product(1, 100));
        cart.add(&product(2, 100));
        assert!(cart.remove(ProductId::new(1)));
        assert!(!cart.remove(ProductId::new(1)));
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_add_zero_is_noop() {
        let mut cart = Cart::new();
        cart.add_quantity(&product(1, 100), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_order_items_preserve_insertion_order() {
        let mut cart = Cart::new();
        cart.add(&product(5, 100));
        cart.add_quantity(&product(2, 100), 3);
        assert_eq!(
            cart.order_items(),
            vec![
                OrderItemRequest {
                    product_id: ProductId::new(5),
                    quantity: 1
                },
                OrderItemRequest {
                    product_id: ProductId::new(2),
                    quantity: 3
                },
            ]
        );
    }
}
