//! QR code types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use snaplist_core::{QrCodeId, ShortCode, UserId};

/// A trackable QR code owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCode {
    pub id: QrCodeId,
    pub user_id: UserId,
    pub short_code: ShortCode,
    pub name: String,
    pub destination_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl QrCode {
    #[must_use]
    pub fn summary(&self) -> QrCodeSummary {
        QrCodeSummary {
            id: self.id,
            name: self.name.clone(),
            short_code: self.short_code.clone(),
            destination_url: self.destination_url.clone(),
        }
    }
}

/// The fields of a QR code shown next to a cart item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeSummary {
    pub id: QrCodeId,
    pub name: String,
    pub short_code: ShortCode,
    pub destination_url: String,
}

/// Input for inserting a QR code.
#[derive(Debug, Clone)]
pub struct NewQrCode {
    pub user_id: UserId,
    pub short_code: ShortCode,
    pub name: String,
    pub destination_url: String,
}
