//! ZaloPay v2 order and callback rules.
//!
//! - Order MAC: HMAC-SHA256 under `key1` over
//!   `app_id|app_trans_id|app_user|amount|app_time|embed_data|item`.
//! - Callback MAC: HMAC-SHA256 under `key2` over the raw `data` string.
//! - Redirect checksum: HMAC-SHA256 under `key2` over
//!   `appid|apptransid|pmcid|bankcode|amount|discountamount|status`.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{vietnam_local, VerifiedResult, VerifyError};
use crate::hashing::{digests_match, hmac_sha256_hex};
use crate::types::{Amount, DbId, Timestamp};

/// `return_code` ZaloPay uses for success, both in order responses and acks.
pub const SUCCESS_RETURN_CODE: i32 = 1;

/// Redirect `status` value for a paid order.
pub const REDIRECT_STATUS_PAID: &str = "1";

/// Build an `app_trans_id`: `yyMMdd_` (Vietnam date) followed by the booking
/// id and six random digits.
pub fn app_trans_id(now: Timestamp, booking_id: DbId) -> String {
    let suffix: u32 = rand::rng().random_range(0..1_000_000);
    format!(
        "{}_{booking_id}{suffix:06}",
        vietnam_local(now).format("%y%m%d")
    )
}

// ---------------------------------------------------------------------------
// Order creation
// ---------------------------------------------------------------------------

/// Form body for `POST /v2/create`.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub app_id: String,
    pub app_trans_id: String,
    pub app_user: String,
    pub app_time: i64,
    pub amount: Amount,
    pub item: String,
    pub embed_data: String,
    pub description: String,
    pub bank_code: String,
    pub callback_url: String,
    pub mac: String,
}

impl OrderRequest {
    /// The exact string covered by the order MAC.
    pub fn mac_input(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            self.app_id,
            self.app_trans_id,
            self.app_user,
            self.amount,
            self.app_time,
            self.embed_data,
            self.item
        )
    }

    /// Compute and attach the order MAC.
    pub fn signed(mut self, key1: &str) -> Self {
        self.mac = hmac_sha256_hex(key1, &self.mac_input());
        self
    }
}

/// Response body from `POST /v2/create`.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderResponse {
    pub return_code: i32,
    #[serde(default)]
    pub return_message: String,
    #[serde(default)]
    pub sub_return_code: Option<i32>,
    #[serde(default)]
    pub sub_return_message: Option<String>,
    #[serde(default)]
    pub order_url: String,
    #[serde(default)]
    pub zp_trans_token: Option<String>,
}

impl OrderResponse {
    pub fn is_success(&self) -> bool {
        self.return_code == SUCCESS_RETURN_CODE
    }
}

// ---------------------------------------------------------------------------
// Server-to-server callback
// ---------------------------------------------------------------------------

/// Envelope POSTed by ZaloPay to the callback URL.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackBody {
    /// JSON document serialized as a string; the MAC covers it verbatim.
    pub data: String,
    pub mac: String,
    #[serde(rename = "type", default)]
    pub kind: Option<i32>,
}

/// Decoded `data` document of a callback.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackData {
    pub app_trans_id: String,
    pub amount: Amount,
    #[serde(default)]
    pub zp_trans_id: i64,
    #[serde(default)]
    pub server_time: i64,
    #[serde(default)]
    pub channel: i32,
}

/// Verify a callback MAC and decode its data.
///
/// ZaloPay only calls back for paid orders, so a verified callback is a
/// success.
pub fn verify_callback(key2: &str, body: &CallbackBody) -> Result<VerifiedResult, VerifyError> {
    let expected = hmac_sha256_hex(key2, &body.data);
    if !digests_match(&expected, &body.mac) {
        return Err(VerifyError::SignatureMismatch {
            expected,
            received: body.mac.clone(),
        });
    }

    let data: CallbackData =
        serde_json::from_str(&body.data).map_err(|e| VerifyError::Malformed(e.to_string()))?;

    Ok(VerifiedResult {
        transaction_id: data.app_trans_id,
        succeeded: true,
        return_code: SUCCESS_RETURN_CODE.to_string(),
        message: format!("zp_trans_id {}", data.zp_trans_id),
        amount: Some(data.amount),
    })
}

// ---------------------------------------------------------------------------
// Browser redirect
// ---------------------------------------------------------------------------

/// Query parameters ZaloPay appends to the redirect URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RedirectParams {
    #[serde(default)]
    pub appid: String,
    #[serde(default)]
    pub apptransid: String,
    #[serde(default)]
    pub pmcid: String,
    #[serde(default)]
    pub bankcode: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub discountamount: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub checksum: String,
}

impl RedirectParams {
    pub fn checksum_input(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            self.appid,
            self.apptransid,
            self.pmcid,
            self.bankcode,
            self.amount,
            self.discountamount,
            self.status
        )
    }
}

/// Verify a redirect checksum. `status == "1"` means paid.
pub fn verify_redirect(key2: &str, params: &RedirectParams) -> Result<VerifiedResult, VerifyError> {
    let expected = hmac_sha256_hex(key2, &params.checksum_input());
    if !digests_match(&expected, &params.checksum) {
        return Err(VerifyError::SignatureMismatch {
            expected,
            received: params.checksum.clone(),
        });
    }
    if params.apptransid.is_empty() {
        return Err(VerifyError::Malformed("missing apptransid".into()));
    }

    Ok(VerifiedResult {
        transaction_id: params.apptransid.clone(),
        succeeded: params.status == REDIRECT_STATUS_PAID,
        return_code: params.status.clone(),
        message: format!("redirect status {}", params.status),
        amount: params.amount.parse().ok(),
    })
}

// ---------------------------------------------------------------------------
// Acknowledgement
// ---------------------------------------------------------------------------

/// Body returned to ZaloPay from the callback endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub return_code: i32,
    pub return_message: String,
}

impl Ack {
    pub fn success() -> Self {
        Self {
            return_code: SUCCESS_RETURN_CODE,
            return_message: "success".into(),
        }
    }

    pub fn invalid_mac() -> Self {
        Self {
            return_code: -1,
            return_message: "mac not equal".into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            return_code: 0,
            return_message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> OrderRequest {
        OrderRequest {
            app_id: "2553".into(),
            app_trans_id: "260301_100123456".into(),
            app_user: "booking-100".into(),
            app_time: 1_772_400_000_000,
            amount: 150_000,
            item: "[]".into(),
            embed_data: r#"{"redirecturl":"https://example.com/return"}"#.into(),
            description: "Cinebook - Payment for booking BK100".into(),
            bank_code: String::new(),
            callback_url: "https://example.com/callback".into(),
            mac: String::new(),
        }
    }

    #[test]
    fn order_mac_input_follows_zalopay_field_order() {
        assert_eq!(
            order().mac_input(),
            r#"2553|260301_100123456|booking-100|150000|1772400000000|{"redirecturl":"https://example.com/return"}|[]"#
        );
    }

    #[test]
    fn signed_order_carries_hmac_of_mac_input() {
        let order = order().signed("key1");
        assert_eq!(order.mac, hmac_sha256_hex("key1", &order.mac_input()));
    }

    #[test]
    fn app_trans_id_has_date_prefix_and_booking_id() {
        let now = chrono::DateTime::parse_from_rfc3339("2026-03-01T18:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let id = app_trans_id(now, 100);
        // 18:00 UTC is already 2 March in Vietnam.
        assert!(id.starts_with("260302_100"), "got {id}");
        assert_eq!(id.len(), "260302_100".len() + 6);
    }

    #[test]
    fn callback_with_valid_mac_is_success() {
        let data = r#"{"app_id":2553,"app_trans_id":"260301_100123456","amount":150000,"zp_trans_id":240301000001,"server_time":1772400000000,"channel":38}"#;
        let body = CallbackBody {
            data: data.into(),
            mac: hmac_sha256_hex("key2", data),
            kind: Some(1),
        };

        let verified = verify_callback("key2", &body).unwrap();
        assert_eq!(verified.transaction_id, "260301_100123456");
        assert!(verified.succeeded);
        assert_eq!(verified.amount, Some(150_000));
    }

    #[test]
    fn callback_with_wrong_key_is_rejected_with_both_digests() {
        let data = r#"{"app_trans_id":"260301_100123456","amount":150000}"#;
        let body = CallbackBody {
            data: data.into(),
            mac: hmac_sha256_hex("not-key2", data),
            kind: None,
        };

        match verify_callback("key2", &body).unwrap_err() {
            VerifyError::SignatureMismatch { expected, received } => {
                assert_eq!(expected, hmac_sha256_hex("key2", data));
                assert_eq!(received, body.mac);
            }
            other => panic!("expected signature mismatch, got {other:?}"),
        }
    }

    #[test]
    fn callback_with_valid_mac_but_bad_json_is_malformed() {
        let body = CallbackBody {
            data: "not json".into(),
            mac: hmac_sha256_hex("key2", "not json"),
            kind: None,
        };
        assert!(matches!(
            verify_callback("key2", &body),
            Err(VerifyError::Malformed(_))
        ));
    }

    #[test]
    fn redirect_status_maps_to_outcome() {
        let mut params = RedirectParams {
            appid: "2553".into(),
            apptransid: "260301_100123456".into(),
            pmcid: "38".into(),
            bankcode: String::new(),
            amount: "150000".into(),
            discountamount: "0".into(),
            status: "1".into(),
            checksum: String::new(),
        };
        params.checksum = hmac_sha256_hex("key2", &params.checksum_input());
        assert!(verify_redirect("key2", &params).unwrap().succeeded);

        params.status = "-49".into();
        params.checksum = hmac_sha256_hex("key2", &params.checksum_input());
        let verified = verify_redirect("key2", &params).unwrap();
        assert!(!verified.succeeded);
        assert_eq!(verified.return_code, "-49");
    }

    #[test]
    fn ack_serializes_zalopay_field_names() {
        let json = serde_json::to_value(Ack::invalid_mac()).unwrap();
        assert_eq!(json["return_code"], -1);
        assert_eq!(json["return_message"], "mac not equal");
    }
}
