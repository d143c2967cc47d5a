//! Payment provider wire rules.
//!
//! Each provider submodule owns its canonical-string construction, request
//! signing, callback verification, success-code mapping and acknowledgement
//! vocabulary. Canonical strings are fixed external contracts: field order
//! and inclusion rules are reproduced exactly as each provider documents them.

pub mod momo;
pub mod vnpay;
pub mod zalopay;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{Amount, DbId, Timestamp};

/// Supported payment providers. Serialized as the lowercase route segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProvider {
    ZaloPay,
    VnPay,
    MoMo,
}

impl PaymentProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ZaloPay => "zalopay",
            Self::VnPay => "vnpay",
            Self::MoMo => "momo",
        }
    }
}

impl fmt::Display for PaymentProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentProvider {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zalopay" => Ok(Self::ZaloPay),
            "vnpay" => Ok(Self::VnPay),
            "momo" => Ok(Self::MoMo),
            other => Err(CoreError::Validation(format!(
                "Unknown payment provider '{other}'"
            ))),
        }
    }
}

/// A provider callback whose signature has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedResult {
    /// Our transaction reference echoed back by the provider.
    pub transaction_id: String,
    /// Whether the provider reports the payment as successful.
    pub succeeded: bool,
    /// Raw provider result code, stored for audit.
    pub return_code: String,
    pub message: String,
    /// Amount reported by the provider, in VND.
    pub amount: Option<Amount>,
}

/// Why a callback payload could not be trusted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("Signature mismatch (expected {expected}, received {received})")]
    SignatureMismatch { expected: String, received: String },

    #[error("Malformed callback payload: {0}")]
    Malformed(String),
}

/// Generate a unique transaction reference of the form
/// `<provider>-<booking_id>-<uuid>`.
pub fn transaction_ref(provider: PaymentProvider, booking_id: DbId) -> String {
    format!(
        "{provider}-{booking_id}-{}",
        uuid::Uuid::new_v4().simple()
    )
}

/// Wall-clock time in Vietnam (UTC+7), which all three providers use for
/// their date fields.
pub(crate) fn vietnam_local(ts: Timestamp) -> chrono::NaiveDateTime {
    (ts + chrono::Duration::hours(7)).naive_utc()
}
