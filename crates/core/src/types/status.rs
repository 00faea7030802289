//! Order status.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Order lifecycle status as reported by the API.
///
/// The API only ever assigns `pending`, `completed` or `cancelled`; any
/// other value decodes as [`OrderStatus::Unknown`] instead of failing the
/// whole order list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Whether the order can still change state.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_known_statuses() {
        let status: OrderStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(status, OrderStatus::Completed);
        assert!(!status.is_open());
        assert!(OrderStatus::Pending.is_open());
    }

    #[test]
    fn test_unrecognised_status_is_unknown() {
        let status: OrderStatus = serde_json::from_str("\"refunded\"").unwrap();
        assert_eq!(status, OrderStatus::Unknown);
        assert_eq!(status.to_string(), "unknown");
    }
}
