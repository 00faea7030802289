//! Review draft for the selected product.

use the_shop_core::Rating;

/// A review being written. Reset after each successful submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewDraft {
    pub rating: Rating,
    comment: String,
}

impl ReviewDraft {
    /// Replace the comment text.
    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    /// The comment as typed.
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// The comment to send: `None` when blank.
    #[must_use]
    pub fn comment_for_submit(&self) -> Option<&str> {
        let trimmed = self.comment.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    /// Back to five stars and no comment.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
