//! Review intents for the selected product and the user's own reviews.

use the_shop_core::{Rating, ReviewId};
use tracing::{info, warn};

use super::{SessionManager, fail};
use crate::api::{Review, ReviewCreate, ReviewUpdate};
use crate::error::{Action, ActionError, add_breadcrumb};

impl SessionManager {
    /// Set the draft's rating and, when given, its comment.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Invalid`] if the rating is outside 1-5; the
    /// draft is left unchanged.
    pub fn set_review_draft(
        &mut self,
        rating: i64,
        comment: Option<&str>,
    ) -> Result<(), ActionError> {
        let rating = Rating::new(rating).map_err(|e| ActionError::Invalid(e.to_string()))?;
        self.state.review_draft.rating = rating;
        if let Some(comment) = comment {
            self.state.review_draft.set_comment(comment);
        }
        Ok(())
    }

    /// Submit the draft for the selected product.
    ///
    /// On success the draft is reset and the product's reviews re-fetched.
    /// On failure the draft is kept and the server's message returned as is
    /// (for example a duplicate review).
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Invalid`] with no product selected,
    /// [`ActionError::LoginRequired`] without a session, and
    /// [`ActionError::Request`] if the server rejects the review.
    pub async fn submit_review(&mut self) -> Result<Review, ActionError> {
        let Some(product_id) = self.state.selected.as_ref().map(|d| d.product.id) else {
            return Err(fail(ActionError::Invalid("No product selected".to_string())));
        };
        let token = self.require_token()?;
        add_breadcrumb(
            "review",
            "Submit review",
            &[("product_id", product_id.to_string())],
        );

        let draft = &self.state.review_draft;
        let body = ReviewCreate {
            product_id,
            rating: draft.rating,
            comment: draft.comment_for_submit(),
        };

        match self.api.submit_review(&token, &body).await {
            Ok(review) => {
                info!(review_id = %review.id, product_id = %product_id, "Review submitted");
                self.state.review_draft.reset();
                self.refresh_selected_reviews().await;
                Ok(review)
            }
            Err(e) => Err(fail(ActionError::request(Action::SubmitReview, e))),
        }
    }

    /// Change the rating and/or comment of one of the user's reviews.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Invalid`] when nothing would change,
    /// [`ActionError::LoginRequired`] without a session, and
    /// [`ActionError::Request`] if the server rejects the update.
    pub async fn update_review(
        &mut self,
        review_id: ReviewId,
        rating: Option<Rating>,
        comment: Option<&str>,
    ) -> Result<Review, ActionError> {
        if rating.is_none() && comment.is_none() {
            return Err(fail(ActionError::Invalid("Nothing to update".to_string())));
        }
        let token = self.require_token()?;
        add_breadcrumb(
            "review",
            "Update review",
            &[("review_id", review_id.to_string())],
        );

        let body = ReviewUpdate { rating, comment };
        match self.api.update_review(&token, review_id, &body).await {
            Ok(review) => {
                self.after_review_change().await;
                Ok(review)
            }
            Err(e) => Err(fail(ActionError::request(Action::UpdateReview, e))),
        }
    }

    /// Delete one of the user's reviews.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::LoginRequired`] without a session and
    /// [`ActionError::Request`] if the server rejects the deletion.
    pub async fn delete_review(&mut self, review_id: ReviewId) -> Result<(), ActionError> {
        let token = self.require_token()?;
        add_breadcrumb(
            "review",
            "Delete review",
            &[("review_id", review_id.to_string())],
        );

        match self.api.delete_review(&token, review_id).await {
            Ok(()) => {
                self.after_review_change().await;
                Ok(())
            }
            Err(e) => Err(fail(ActionError::request(Action::DeleteReview, e))),
        }
    }

    /// Refresh the profile's review list and the open product's reviews.
    async fn after_review_change(&mut self) {
        let Some(token) = self.token() else {
            return;
        };
        match self.api.my_reviews(&token).await {
            Ok(reviews) => {
                self.state.profile.reviews = reviews;
                self.state.profile.reviews_error = None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to refresh own reviews");
                let error = ActionError::request(Action::FetchMyReviews, e);
                self.state.profile.reviews_error = Some(error.user_message());
            }
        }
        self.refresh_selected_reviews().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::manager::tests::offline_manager;

    #[test]
    fn test_set_review_draft() {
        let mut manager = offline_manager();
        manager.set_review_draft(3, Some("Solid")).unwrap();
        assert_eq!(manager.state().review_draft().rating.stars(), 3);
        assert_eq!(manager.state().review_draft().comment(), "Solid");

        let err = manager.set_review_draft(6, None).unwrap_err();
        assert_eq!(err.user_message(), "rating must be between 1 and 5 (got 6)");
        assert_eq!(manager.state().review_draft().rating.stars(), 3);
    }

    #[tokio::test]
    async fn test_submit_without_selection() {
        let mut manager = offline_manager();
        let err = manager.submit_review().await.unwrap_err();
        assert_eq!(err.user_message(), "No product selected");
    }

    #[tokio::test]
    async fn test_update_requires_a_change() {
        let mut manager = offline_manager();
        let err = manager
            .update_review(ReviewId::new(1), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ActionError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_delete_requires_login() {
        let mut manager = offline_manager();
        assert!(matches!(
            manager.delete_review(ReviewId::new(1)).await,
            Err(ActionError::LoginRequired)
        ));
    }
}
