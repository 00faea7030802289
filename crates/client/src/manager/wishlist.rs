//! Wishlist intents.
//!
//! Membership changes only after the server confirms them. A failed toggle
//! drops the pending mark and re-fetches the server's list.

use secrecy::SecretString;
use the_shop_core::ProductId;
use tracing::{debug, warn};

use super::{SessionManager, fail};
use crate::error::{Action, ActionError, add_breadcrumb};
use crate::state::PendingChange;

impl SessionManager {
    /// Add or remove a product, depending on current membership.
    ///
    /// Returns whether the product is on the wishlist afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::LoginRequired`] (opening the login prompt)
    /// without a session, and [`ActionError::Request`] if the server
    /// rejected the change.
    pub async fn toggle_wishlist(&mut self, product_id: ProductId) -> Result<bool, ActionError> {
        let token = self.require_token()?;

        let change = self.state.wishlist.begin_toggle(product_id);
        add_breadcrumb(
            "wishlist",
            match change {
                PendingChange::Add => "Add to wishlist",
                PendingChange::Remove => "Remove from wishlist",
            },
            &[("product_id", product_id.to_string())],
        );

        let result = match change {
            PendingChange::Add => self
                .api
                .add_to_wishlist(&token, product_id)
                .await
                .map(|_| ()),
            PendingChange::Remove => self.api.remove_from_wishlist(&token, product_id).await,
        };

        match result {
            Ok(()) => {
                self.state.wishlist.confirm(product_id, change);
                debug!(product_id = %product_id, ?change, "Wishlist updated");
                Ok(self.state.wishlist.contains(product_id))
            }
            Err(e) => {
                self.state.wishlist.abandon(product_id);
                let error = fail(ActionError::request(Action::UpdateWishlist, e));
                if let Err(reconcile) = self.fetch_wishlist(&token).await {
                    warn!(error = %reconcile, "Wishlist reconciliation failed");
                }
                Err(error)
            }
        }
    }

    /// Reload the wishlist from the server.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::LoginRequired`] without a session and
    /// [`ActionError::Request`] if the list could not be fetched.
    pub async fn refresh_wishlist(&mut self) -> Result<(), ActionError> {
        let token = self.require_token()?;
        self.fetch_wishlist(&token).await
    }

    /// Ask the server whether a product is listed and align local state.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::LoginRequired`] without a session and
    /// [`ActionError::Request`] if the check failed.
    pub async fn check_wishlist(&mut self, product_id: ProductId) -> Result<bool, ActionError> {
        let token = self.require_token()?;
        match self.api.wishlist_contains(&token, product_id).await {
            Ok(listed) => {
                if listed != self.state.wishlist.contains(product_id) {
                    debug!(product_id = %product_id, listed, "Local wishlist was out of date");
                }
                self.state.wishlist.set_member(product_id, listed);
                Ok(listed)
            }
            Err(e) => Err(fail(ActionError::request(Action::CheckWishlist, e))),
        }
    }

    async fn fetch_wishlist(&mut self, token: &SecretString) -> Result<(), ActionError> {
        let result = self.api.wishlist(token).await;
        self.apply_wishlist(result)
    }
}
