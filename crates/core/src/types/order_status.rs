//! Order lifecycle status.
//!
//! Each status carries its own customer-facing label, accent color and
//! message. Adding a variant fails to compile until every lookup handles it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a string is not a known order status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid order status: {0}")]
pub struct ParseOrderStatusError(pub String);

/// Order status, stored lowercase in `orders.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Capitalized label used in subjects and headings.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Accent color (hex) for the status badge.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Pending => "#f59e0b",
            Self::Processing => "#3b82f6",
            Self::Shipped => "#8b5cf6",
            Self::Delivered => "#10b981",
            Self::Cancelled => "#ef4444",
        }
    }

    /// Sentence explaining the status to the customer.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Pending => "We have received your order and will start preparing it shortly.",
            Self::Processing => "Your order is being printed and prepared for shipment.",
            Self::Shipped => "Great news! Your order has been shipped and is on its way.",
            Self::Delivered => "Your order has been delivered. We hope you enjoy your QR products!",
            Self::Cancelled => {
                "Your order has been cancelled. If you did not request this, please contact support."
            }
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ParseOrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            _ => Err(ParseOrderStatusError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Shipped".parse(), Ok(OrderStatus::Shipped));
        assert_eq!(" DELIVERED ".parse(), Ok(OrderStatus::Delivered));
        assert_eq!("canceled".parse(), Ok(OrderStatus::Cancelled));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "lost-in-transit".parse::<OrderStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid order status: lost-in-transit");
    }

    #[test]
    fn test_shipped_presentation() {
        let status = OrderStatus::Shipped;
        assert_eq!(status.label(), "Shipped");
        assert!(status.message().contains("shipped and is on its way"));
    }

    #[test]
    fn test_every_status_round_trips() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse(), Ok(status));
            assert!(status.color().starts_with('#'));
        }
    }
}
