//! Wishlist membership with server-confirmed changes.
//!
//! Membership only changes once the server has confirmed it. While a call
//! is in flight the product carries a [`PendingChange`] so a view can show
//! it as "adding…" or "removing…". After a failed call the pending mark is
//! dropped and the set is replaced with the server's list.

use std::collections::{BTreeMap, BTreeSet};

use the_shop_core::ProductId;

use crate::api::WishlistResponse;

/// Direction of an unconfirmed wishlist change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingChange {
    Add,
    Remove,
}

/// The set of wishlisted product ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wishlist {
    members: BTreeSet<ProductId>,
    pending: BTreeMap<ProductId, PendingChange>,
}

impl Wishlist {
    /// Create an empty wishlist.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            members: BTreeSet::new(),
            pending: BTreeMap::new(),
        }
    }

    /// Whether `product_id` is a confirmed member.
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.members.contains(&product_id)
    }

    /// The unconfirmed change for `product_id`, if any.
    #[must_use]
    pub fn pending(&self, product_id: ProductId) -> Option<PendingChange> {
        self.pending.get(&product_id).copied()
    }

    /// Confirmed members in id order.
    pub fn iter(&self) -> impl Iterator<Item = ProductId> + '_ {
        self.members.iter().copied()
    }

    /// Number of confirmed members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether there are no confirmed members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Mark the toggle of `product_id` as in flight and return its direction.
    pub fn begin_toggle(&mut self, product_id: ProductId) -> PendingChange {
        let change = if self.contains(product_id) {
            PendingChange::Remove
        } else {
            PendingChange::Add
        };
        self.pending.insert(product_id, change);
        change
    }

    /// Apply a change the server confirmed.
    pub fn confirm(&mut self, product_id: ProductId, change: PendingChange) {
        self.pending.remove(&product_id);
        match change {
            PendingChange::Add => {
                self.members.insert(product_id);
            }
            PendingChange::Remove => {
                self.members.remove(&product_id);
            }
        }
    }

    /// Drop the pending mark without changing membership.
    pub fn abandon(&mut self, product_id: ProductId) {
        self.pending.remove(&product_id);
    }

    /// Set membership of one product from a server answer.
    pub fn set_member(&mut self, product_id: ProductId, member: bool) {
        if member {
            self.members.insert(product_id);
        } else {
            self.members.remove(&product_id);
        }
    }

    /// Replace membership with the server's list. Pending marks survive.
    pub fn replace_with(&mut self, response: &WishlistResponse) {
        self.members = response.items.iter().map(|item| item.product_id).collect();
    }

    /// Forget everything (used on logout).
    pub fn clear(&mut self) {
        self.members.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::WishlistItem;

    fn item(id: i64) -> WishlistItem {
        WishlistItem {
            id: None,
            product_id: ProductId::new(id),
            created_at: None,
        }
    }

    #[test]
    fn test_toggle_twice_restores_membership() {
        let mut wishlist = Wishlist::new();
        let id = ProductId::new(3);

        let change = wishlist.begin_toggle(id);
        assert_eq!(change, PendingChange::Add);
        assert!(!wishlist.contains(id), "not applied before confirmation");
        assert_eq!(wishlist.pending(id), Some(PendingChange::Add));
        wishlist.confirm(id, change);
        assert!(wishlist.contains(id));
        assert_eq!(wishlist.pending(id), None);

        let change = wishlist.begin_toggle(id);
        assert_eq!(change, PendingChange::Remove);
        wishlist.confirm(id, change);
        assert!(!wishlist.contains(id));
    }

    #[test]
    fn test_abandon_keeps_membership() {
        let mut wishlist = Wishlist::new();
        let id = ProductId::new(8);
        wishlist.begin_toggle(id);
        wishlist.abandon(id);
        assert!(!wishlist.contains(id));
        assert_eq!(wishlist.pending(id), None);
    }

    #[test]
    fn test_replace_with_server_list_deduplicates() {
        let mut wishlist = Wishlist::new();
        wishlist.set_member(ProductId::new(99), true);
        wishlist.replace_with(&WishlistResponse {
            items: vec![item(1), item(2), item(1)],
            count: Some(3),
        });
        assert_eq!(wishlist.len(), 2);
        assert!(!wishlist.contains(ProductId::new(99)));
        assert_eq!(
            wishlist.iter().collect::<Vec<_>>(),
            vec![ProductId::new(1), ProductId::new(2)]
        );
    }

    #[test]
    fn test_clear() {
        let mut wishlist = Wishlist::new();
        wishlist.set_member(ProductId::new(1), true);
        wishlist.begin_toggle(ProductId::new(2));
        wishlist.clear();
        assert!(wishlist.is_empty());
        assert_eq!(wishlist.pending(ProductId::new(2)), None);
    }
}
