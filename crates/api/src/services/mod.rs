//! Business logic on top of the store layer.
//!
//! Services borrow [`Stores`](crate::db::Stores) (and the email service where
//! they notify) for the duration of one request or CLI command.

pub mod auth;
pub mod cart;
pub mod email;
pub mod membership;
pub mod newsletter;
pub mod orders;
pub mod qr_codes;
pub mod redirect;
