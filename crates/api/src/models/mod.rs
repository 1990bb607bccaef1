//! Domain models for the SnapList API.
//!
//! These are validated domain objects, separate from database row types. All
//! of them serialize to the camelCase JSON the frontend consumes.

pub mod cart;
pub mod membership;
pub mod newsletter;
pub mod order;
pub mod qr_code;
pub mod session;
pub mod user;

pub use cart::{CartItem, CartItemWithQrCode, NewCartItem};
pub use membership::{MembershipTier, TierDefinition};
pub use newsletter::NewsletterSubscriber;
pub use order::{Order, OrderItem, OrderWithItems};
pub use qr_code::{NewQrCode, QrCode, QrCodeSummary};
pub use session::{CurrentUser, session_keys};
pub use user::{NewUser, User};
