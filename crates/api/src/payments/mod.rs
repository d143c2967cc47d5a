//! Payment provider adapters.
//!
//! Each provider module creates orders (signed with the rules in
//! `cinebook_core::payment`) and turns callbacks into settlements. Callback
//! handling never fails: every path ends in the provider's acknowledgement
//! vocabulary, and only signature-verified results reach the database.

pub mod config;
pub mod momo;
pub mod orders;
pub mod redirect;
pub mod settlement;
pub mod vnpay;
pub mod zalopay;

use std::collections::HashMap;
use std::time::Duration;

use cinebook_core::payment::PaymentProvider;

use self::config::PaymentsConfig;

/// Failure talking to a provider while creating an order.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} request failed: {source}")]
    Http {
        provider: PaymentProvider,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned an unreadable response: {message}")]
    Decode {
        provider: PaymentProvider,
        message: String,
    },

    #[error("{provider} rejected the order ({code}): {message}")]
    Rejected {
        provider: PaymentProvider,
        code: String,
        message: String,
    },
}

impl ProviderError {
    fn http(provider: PaymentProvider) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Http { provider, source }
    }

    fn decode(provider: PaymentProvider) -> impl FnOnce(serde_json::Error) -> Self {
        move |err| Self::Decode {
            provider,
            message: err.to_string(),
        }
    }
}

/// Build the shared client used for provider calls.
///
/// Every request is bounded by `provider_timeout_secs`; a timeout surfaces as
/// [`ProviderError::Http`] and nothing is persisted.
pub fn provider_client(config: &PaymentsConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.provider_timeout_secs))
        .build()
}

/// POST a JSON or form body and return the decoded JSON response.
async fn post_for_json(
    provider: PaymentProvider,
    request: reqwest::RequestBuilder,
) -> Result<serde_json::Value, ProviderError> {
    let response = request
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(ProviderError::http(provider))?;

    response
        .json::<serde_json::Value>()
        .await
        .map_err(ProviderError::http(provider))
}

/// Decode a form-urlencoded query into a flat map. Malformed input yields an
/// empty map, which then fails signature verification.
pub(crate) fn query_map(query: &str) -> HashMap<String, String> {
    serde_urlencoded::from_str(query).unwrap_or_default()
}

/// The query map as a JSON object, for audit storage.
pub(crate) fn query_payload(params: &HashMap<String, String>) -> serde_json::Value {
    serde_json::to_value(params).unwrap_or_default()
}
