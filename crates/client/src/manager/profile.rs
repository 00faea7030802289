//! Tab navigation and the profile view.

use the_shop_core::OrderId;

use super::{SessionManager, fail};
use crate::api::Order;
use crate::error::{Action, ActionError, add_breadcrumb};
use crate::state::Tab;

impl SessionManager {
    /// Switch tabs. Selecting [`Tab::Profile`] loads the profile.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::LoginRequired`] (opening the login prompt and
    /// keeping the current tab) when selecting the profile anonymously.
    pub async fn select_tab(&mut self, tab: Tab) -> Result<(), ActionError> {
        if tab == Tab::Profile {
            self.load_profile().await?;
        }
        self.state.tab = tab;
        Ok(())
    }

    /// Fetch the user's orders and own reviews concurrently.
    ///
    /// Both fetches are best effort: a failure is recorded on the profile
    /// and does not affect the other.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::LoginRequired`] without a session.
    pub async fn load_profile(&mut self) -> Result<(), ActionError> {
        let token = self.require_token()?;
        add_breadcrumb("navigation", "Viewed profile", &[]);

        let (orders, reviews) =
            tokio::join!(self.api.orders(&token), self.api.my_reviews(&token));

        let profile = &mut self.state.profile;
        match orders {
            Ok(orders) => {
                profile.orders = orders;
                profile.orders_error = None;
            }
            Err(e) => {
                let error = fail(ActionError::request(Action::FetchOrders, e));
                profile.orders_error = Some(error.user_message());
            }
        }
        match reviews {
            Ok(reviews) => {
                profile.reviews = reviews;
                profile.reviews_error = None;
            }
            Err(e) => {
                let error = fail(ActionError::request(Action::FetchMyReviews, e));
                profile.reviews_error = Some(error.user_message());
            }
        }
        Ok(())
    }

    /// Fetch one of the user's orders.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::LoginRequired`] without a session and
    /// [`ActionError::Request`] if the order is missing or not the user's.
    pub async fn fetch_order(&mut self, order_id: OrderId) -> Result<Order, ActionError> {
        let token = self.require_token()?;
        self.api
            .order(&token, order_id)
            .await
            .map_err(|e| fail(ActionError::request(Action::FetchOrder, e)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manager::tests::offline_manager;

    #[tokio::test]
    async fn test_anonymous_profile_keeps_tab() {
        let mut manager = offline_manager();
        manager.select_tab(Tab::Cart).await.unwrap();

        let err = manager.select_tab(Tab::Profile).await.unwrap_err();

        assert!(matches!(err, ActionError::LoginRequired));
        assert_eq!(manager.state().tab(), Tab::Cart);
        assert!(manager.state().auth_prompt().is_open());
    }

    #[tokio::test]
    async fn test_other_tabs_need_no_session() {
        let mut manager = offline_manager();
        for tab in [Tab::Products, Tab::Cart, Tab::Wishlist] {
            manager.select_tab(tab).await.unwrap();
            assert_eq!(manager.state().tab(), tab);
        }
    }
}
