//! Core types for SnapList.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod order_status;
pub mod short_code;
pub mod tier;

pub use email::{Email, EmailError};
pub use id::*;
pub use order_status::{OrderStatus, ParseOrderStatusError};
pub use short_code::{ShortCode, ShortCodeError};
pub use tier::{ParseTierNameError, TierName};
