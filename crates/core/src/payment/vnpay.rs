//! VNPay 2.1.0 payment URL and IPN rules.
//!
//! The signed string is every `vnp_*` parameter except `vnp_SecureHash` and
//! `vnp_SecureHashType`, sorted by key and form-urlencoded, signed with
//! HMAC-SHA512 under the merchant hash secret. Amounts travel multiplied by
//! 100.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::{vietnam_local, VerifiedResult, VerifyError};
use crate::hashing::{digests_match, hmac_sha512_hex};
use crate::types::{Amount, Timestamp};

pub const VERSION: &str = "2.1.0";
pub const COMMAND: &str = "pay";
pub const CURRENCY: &str = "VND";
pub const LOCALE: &str = "vn";
pub const ORDER_TYPE: &str = "other";

pub const SECURE_HASH: &str = "vnp_SecureHash";
pub const SECURE_HASH_TYPE: &str = "vnp_SecureHashType";

/// `vnp_ResponseCode` / `vnp_TransactionStatus` value for success.
pub const SUCCESS_CODE: &str = "00";

/// Payment links expire this long after creation.
pub const ORDER_EXPIRY_MINUTES: i64 = 15;

/// VNPay transmits amounts in hundredths of a dong.
pub const AMOUNT_MULTIPLIER: Amount = 100;

/// Format a timestamp as VNPay's `yyyyMMddHHmmss` in Vietnam time.
pub fn format_date(ts: Timestamp) -> String {
    vietnam_local(ts).format("%Y%m%d%H%M%S").to_string()
}

/// Inputs for a payment URL.
#[derive(Debug, Clone)]
pub struct PaymentRequest<'a> {
    pub tmn_code: &'a str,
    pub txn_ref: &'a str,
    pub amount: Amount,
    pub order_info: &'a str,
    pub return_url: &'a str,
    pub ip_addr: &'a str,
    pub created_at: Timestamp,
}

impl PaymentRequest<'_> {
    /// Unsigned `vnp_*` parameters for this request.
    pub fn params(&self) -> BTreeMap<String, String> {
        let expires_at = self.created_at + chrono::Duration::minutes(ORDER_EXPIRY_MINUTES);
        [
            ("vnp_Version", VERSION.to_string()),
            ("vnp_Command", COMMAND.to_string()),
            ("vnp_TmnCode", self.tmn_code.to_string()),
            ("vnp_Amount", (self.amount * AMOUNT_MULTIPLIER).to_string()),
            ("vnp_CurrCode", CURRENCY.to_string()),
            ("vnp_TxnRef", self.txn_ref.to_string()),
            ("vnp_OrderInfo", self.order_info.to_string()),
            ("vnp_OrderType", ORDER_TYPE.to_string()),
            ("vnp_Locale", LOCALE.to_string()),
            ("vnp_ReturnUrl", self.return_url.to_string()),
            ("vnp_IpAddr", self.ip_addr.to_string()),
            ("vnp_CreateDate", format_date(self.created_at)),
            ("vnp_ExpireDate", format_date(expires_at)),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

/// The canonical signed string: sorted `vnp_*` params, hash fields excluded.
pub fn canonical_query<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let signed: BTreeMap<&str, &str> = params
        .into_iter()
        .filter(|(k, _)| k.starts_with("vnp_"))
        .filter(|(k, _)| k.as_str() != SECURE_HASH && k.as_str() != SECURE_HASH_TYPE)
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    // Encoding a map of plain strings cannot fail.
    serde_urlencoded::to_string(&signed).unwrap_or_default()
}

/// Build the redirect URL with the secure hash appended.
pub fn payment_url(base_url: &str, hash_secret: &str, request: &PaymentRequest<'_>) -> String {
    let query = canonical_query(&request.params());
    let hash = hmac_sha512_hex(hash_secret, &query);
    format!("{base_url}?{query}&{SECURE_HASH}={hash}")
}

/// Verify the secure hash on an IPN or return-URL query.
pub fn verify(
    hash_secret: &str,
    params: &HashMap<String, String>,
) -> Result<VerifiedResult, VerifyError> {
    let received = params.get(SECURE_HASH).cloned().unwrap_or_default();
    let expected = hmac_sha512_hex(hash_secret, &canonical_query(params));
    if !digests_match(&expected, &received) {
        return Err(VerifyError::SignatureMismatch { expected, received });
    }

    let field = |name: &str| params.get(name).cloned().unwrap_or_default();
    let txn_ref = field("vnp_TxnRef");
    if txn_ref.is_empty() {
        return Err(VerifyError::Malformed("missing vnp_TxnRef".into()));
    }

    let response_code = field("vnp_ResponseCode");
    let transaction_status = field("vnp_TransactionStatus");
    let amount = field("vnp_Amount")
        .parse::<Amount>()
        .ok()
        .map(|raw| raw / AMOUNT_MULTIPLIER);

    Ok(VerifiedResult {
        transaction_id: txn_ref,
        succeeded: response_code == SUCCESS_CODE && transaction_status == SUCCESS_CODE,
        message: format!("response {response_code}, transaction status {transaction_status}"),
        return_code: response_code,
        amount,
    })
}

/// Body returned to VNPay from the IPN endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {
    #[serde(rename = "RspCode")]
    pub rsp_code: String,
    #[serde(rename = "Message")]
    pub message: String,
}

impl Ack {
    fn new(code: &str, message: &str) -> Self {
        Self {
            rsp_code: code.to_string(),
            message: message.to_string(),
        }
    }

    pub fn confirmed() -> Self {
        Self::new("00", "Confirm Success")
    }

    pub fn order_not_found() -> Self {
        Self::new("01", "Order not found")
    }

    pub fn already_confirmed() -> Self {
        Self::new("02", "Order already confirmed")
    }

    pub fn invalid_amount() -> Self {
        Self::new("04", "Invalid amount")
    }

    pub fn invalid_checksum() -> Self {
        Self::new("97", "Invalid Checksum")
    }

    pub fn unknown_error() -> Self {
        Self::new("99", "Unknown error")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created_at() -> Timestamp {
        chrono::DateTime::parse_from_rfc3339("2026-03-01T03:04:05Z")
            .unwrap()
            .with_timezone(&chrono::Utc)
    }

    fn request() -> PaymentRequest<'static> {
        PaymentRequest {
            tmn_code: "CINE0001",
            txn_ref: "vnpay-100-abc",
            amount: 150_000,
            order_info: "Thanh toan ve BK100",
            return_url: "https://example.com/return",
            ip_addr: "127.0.0.1",
            created_at: created_at(),
        }
    }

    fn signed_ipn(secret: &str, response_code: &str, status: &str) -> HashMap<String, String> {
        let mut params: HashMap<String, String> = [
            ("vnp_TxnRef", "vnpay-100-abc"),
            ("vnp_Amount", "15000000"),
            ("vnp_ResponseCode", response_code),
            ("vnp_TransactionStatus", status),
            ("vnp_TmnCode", "CINE0001"),
            ("vnp_BankCode", "NCB"),
            ("vnp_OrderInfo", "Thanh toan ve BK100"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let hash = hmac_sha512_hex(secret, &canonical_query(&params));
        params.insert(SECURE_HASH.into(), hash);
        params.insert(SECURE_HASH_TYPE.into(), "HmacSHA512".into());
        params
    }

    #[test]
    fn params_scale_amount_and_use_vietnam_dates() {
        let params = request().params();
        assert_eq!(params["vnp_Amount"], "15000000");
        assert_eq!(params["vnp_CreateDate"], "20260301100405");
        assert_eq!(params["vnp_ExpireDate"], "20260301101905");
        assert_eq!(params["vnp_Version"], "2.1.0");
    }

    #[test]
    fn canonical_query_is_sorted_encoded_and_excludes_hash_fields() {
        let params: BTreeMap<String, String> = [
            ("vnp_TxnRef", "t-1"),
            ("vnp_Amount", "100"),
            ("vnp_OrderInfo", "Thanh toan ve"),
            (SECURE_HASH, "deadbeef"),
            (SECURE_HASH_TYPE, "HmacSHA512"),
            ("provider", "vnpay"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(
            canonical_query(&params),
            "vnp_Amount=100&vnp_OrderInfo=Thanh+toan+ve&vnp_TxnRef=t-1"
        );
    }

    #[test]
    fn payment_url_verifies_with_same_secret() {
        let url = payment_url(
            "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html",
            "secret",
            &request(),
        );
        let (_, query) = url.split_once('?').unwrap();
        let params: HashMap<String, String> = serde_urlencoded::from_str(query).unwrap();

        let verified = verify("secret", &params).unwrap();
        assert_eq!(verified.transaction_id, "vnpay-100-abc");
        assert_eq!(verified.amount, Some(150_000));
    }

    #[test]
    fn success_requires_both_codes() {
        assert!(verify("secret", &signed_ipn("secret", "00", "00")).unwrap().succeeded);

        let declined = verify("secret", &signed_ipn("secret", "24", "02")).unwrap();
        assert!(!declined.succeeded);
        assert_eq!(declined.return_code, "24");

        assert!(!verify("secret", &signed_ipn("secret", "00", "01")).unwrap().succeeded);
    }

    #[test]
    fn tampered_params_fail_verification() {
        let mut params = signed_ipn("secret", "00", "00");
        params.insert("vnp_Amount".into(), "100".into());
        assert!(matches!(
            verify("secret", &params),
            Err(VerifyError::SignatureMismatch { .. })
        ));
    }

    #[test]
    fn hash_comparison_ignores_case() {
        let mut params = signed_ipn("secret", "00", "00");
        let upper = params[SECURE_HASH].to_uppercase();
        params.insert(SECURE_HASH.into(), upper);
        assert!(verify("secret", &params).is_ok());
    }

    #[test]
    fn ack_uses_vnpay_field_names() {
        let json = serde_json::to_value(Ack::invalid_amount()).unwrap();
        assert_eq!(json["RspCode"], "04");
        assert_eq!(json["Message"], "Invalid amount");
    }
}
