//! MoMo v2 (`captureWallet`) create and IPN rules.
//!
//! Signatures are HMAC-SHA256 under the partner secret key over a
//! `key=value&...` string whose field order MoMo fixes per message type.

use serde::{Deserialize, Serialize};

use super::{VerifiedResult, VerifyError};
use crate::hashing::{digests_match, hmac_sha256_hex};
use crate::types::Amount;

pub const REQUEST_TYPE: &str = "captureWallet";
pub const LANG: &str = "vi";

/// `resultCode` MoMo uses for success.
pub const SUCCESS_RESULT_CODE: i32 = 0;

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// JSON body for `POST /v2/gateway/api/create`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub partner_code: String,
    pub request_id: String,
    pub amount: Amount,
    pub order_id: String,
    pub order_info: String,
    pub redirect_url: String,
    pub ipn_url: String,
    pub request_type: String,
    pub extra_data: String,
    pub lang: String,
    pub signature: String,
}

impl CreateRequest {
    pub fn signature_input(&self, access_key: &str) -> String {
        format!(
            "accessKey={access_key}&amount={}&extraData={}&ipnUrl={}&orderId={}&orderInfo={}&partnerCode={}&redirectUrl={}&requestId={}&requestType={}",
            self.amount,
            self.extra_data,
            self.ipn_url,
            self.order_id,
            self.order_info,
            self.partner_code,
            self.redirect_url,
            self.request_id,
            self.request_type,
        )
    }

    /// Compute and attach the request signature.
    pub fn signed(mut self, access_key: &str, secret_key: &str) -> Self {
        self.signature = hmac_sha256_hex(secret_key, &self.signature_input(access_key));
        self
    }
}

/// Response body from the create endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateResponse {
    #[serde(default)]
    pub order_id: String,
    pub result_code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub pay_url: String,
}

impl CreateResponse {
    pub fn is_success(&self) -> bool {
        self.result_code == SUCCESS_RESULT_CODE
    }
}

// ---------------------------------------------------------------------------
// IPN / redirect
// ---------------------------------------------------------------------------

/// Result notification, delivered as the IPN JSON body and as the redirect
/// query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultNotification {
    #[serde(default)]
    pub partner_code: String,
    #[serde(default)]
    pub order_id: String,
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub amount: Amount,
    #[serde(default)]
    pub order_info: String,
    #[serde(default)]
    pub order_type: String,
    #[serde(default)]
    pub trans_id: i64,
    #[serde(default)]
    pub result_code: i32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub pay_type: String,
    #[serde(default)]
    pub response_time: i64,
    #[serde(default)]
    pub extra_data: String,
    #[serde(default)]
    pub signature: String,
}

impl ResultNotification {
    pub fn signature_input(&self, access_key: &str) -> String {
        format!(
            "accessKey={access_key}&amount={}&extraData={}&message={}&orderId={}&orderInfo={}&orderType={}&partnerCode={}&payType={}&requestId={}&responseTime={}&resultCode={}&transId={}",
            self.amount,
            self.extra_data,
            self.message,
            self.order_id,
            self.order_info,
            self.order_type,
            self.partner_code,
            self.pay_type,
            self.request_id,
            self.response_time,
            self.result_code,
            self.trans_id,
        )
    }
}

/// Verify a result notification. `resultCode == 0` means paid.
pub fn verify_notification(
    access_key: &str,
    secret_key: &str,
    notification: &ResultNotification,
) -> Result<VerifiedResult, VerifyError> {
    let expected = hmac_sha256_hex(secret_key, &notification.signature_input(access_key));
    if !digests_match(&expected, &notification.signature) {
        return Err(VerifyError::SignatureMismatch {
            expected,
            received: notification.signature.clone(),
        });
    }
    if notification.order_id.is_empty() {
        return Err(VerifyError::Malformed("missing orderId".into()));
    }

    Ok(VerifiedResult {
        transaction_id: notification.order_id.clone(),
        succeeded: notification.result_code == SUCCESS_RESULT_CODE,
        return_code: notification.result_code.to_string(),
        message: notification.message.clone(),
        amount: Some(notification.amount),
    })
}

/// Body returned to MoMo from the IPN endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub partner_code: String,
    pub order_id: String,
    pub request_id: String,
    pub result_code: i32,
    pub message: String,
}

impl Ack {
    fn for_notification(
        notification: &ResultNotification,
        result_code: i32,
        message: &str,
    ) -> Self {
        Self {
            partner_code: notification.partner_code.clone(),
            order_id: notification.order_id.clone(),
            request_id: notification.request_id.clone(),
            result_code,
            message: message.to_string(),
        }
    }

    pub fn success(notification: &ResultNotification) -> Self {
        Self::for_notification(notification, SUCCESS_RESULT_CODE, "success")
    }

    pub fn invalid_signature(notification: &ResultNotification) -> Self {
        Self::for_notification(notification, 97, "invalid signature")
    }

    pub fn failure(notification: &ResultNotification, message: &str) -> Self {
        Self::for_notification(notification, 1, message)
    }
}
