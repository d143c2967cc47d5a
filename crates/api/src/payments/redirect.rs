//! Browser landing page for provider return URLs.
//!
//! The page immediately hands off to the mobile app through
//! `<scheme>://payment-result?transactionId=..&status=..&amount=..`, with a
//! visible link as fallback.

use axum::response::Html;
use cinebook_core::types::Amount;
use cinebook_db::models::payment::SettlementOutcome;
use cinebook_db::models::status::PaymentStatus;

/// Result reported to the app after a provider redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnStatus {
    Success,
    Failed,
    Invalid,
    NotFound,
    Error,
}

impl ReturnStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Invalid => "invalid",
            Self::NotFound => "not_found",
            Self::Error => "error",
        }
    }

    pub fn from_outcome(outcome: &SettlementOutcome) -> Self {
        match outcome {
            SettlementOutcome::Confirmed { .. } => Self::Success,
            SettlementOutcome::AlreadyProcessed { payment }
                if payment.status_id == PaymentStatus::Completed.id() =>
            {
                Self::Success
            }
            SettlementOutcome::AlreadyProcessed { .. } | SettlementOutcome::Declined { .. } => {
                Self::Failed
            }
            SettlementOutcome::AmountMismatch { .. } => Self::Invalid,
            SettlementOutcome::NotFound => Self::NotFound,
        }
    }
}

/// What a return URL resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReturn {
    pub transaction_id: String,
    pub status: ReturnStatus,
    pub amount: Option<Amount>,
}

impl PaymentReturn {
    pub fn new(
        transaction_id: impl Into<String>,
        status: ReturnStatus,
        amount: Option<Amount>,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            status,
            amount,
        }
    }

    pub fn deep_link(&self, scheme: &str) -> String {
        let amount = self.amount.map(|a| a.to_string()).unwrap_or_default();
        let query = serde_urlencoded::to_string(&[
            ("transactionId", self.transaction_id.as_str()),
            ("status", self.status.as_str()),
            ("amount", amount.as_str()),
        ])
        .unwrap_or_default();
        format!("{scheme}://payment-result?{query}")
    }

    pub fn render(&self, scheme: &str) -> Html<String> {
        let deep_link = self.deep_link(scheme);
        let link = escape_html(&deep_link);
        let script_link = script_string(&deep_link);
        let heading = match self.status {
            ReturnStatus::Success => "Payment successful",
            ReturnStatus::Failed => "Payment failed",
            _ => "Payment could not be verified",
        };
        Html(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta http-equiv="refresh" content="0;url={link}">
<title>{heading}</title>
</head>
<body>
<h1>{heading}</h1>
<p><a href="{link}">Return to Cinebook</a></p>
<script>window.location.replace({script_link});</script>
</body>
</html>
"#
        ))
    }
}

/// A JS string literal for use inside `<script>`, where entities are not
/// decoded.
fn script_string(input: &str) -> String {
    serde_json::to_string(input)
        .unwrap_or_else(|_| String::from("\"\""))
        .replace("</", "<\\/")
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deep_link_carries_id_status_and_amount() {
        let ret = PaymentReturn::new("260301_100123456", ReturnStatus::Success, Some(150_000));
        assert_eq!(
            ret.deep_link("cinebook"),
            "cinebook://payment-result?transactionId=260301_100123456&status=success&amount=150000"
        );
    }

    #[test]
    fn missing_amount_is_left_empty() {
        let ret = PaymentReturn::new("", ReturnStatus::Invalid, None);
        assert_eq!(
            ret.deep_link("cinebook"),
            "cinebook://payment-result?transactionId=&status=invalid&amount="
        );
    }

    #[test]
    fn page_escapes_the_link() {
        let ret = PaymentReturn::new("vnpay-1-ab", ReturnStatus::Failed, Some(1));
        let Html(page) = ret.render("cinebook");
        assert!(page.contains("transactionId=vnpay-1-ab&amp;status=failed&amp;amount=1"));
        assert!(page.contains("Payment failed"));
    }

    #[test]
    fn script_navigates_to_the_unescaped_link() {
        let ret = PaymentReturn::new("vnpay-1-ab", ReturnStatus::Success, Some(150_000));
        let Html(page) = ret.render("cinebook");
        let script = page
            .lines()
            .find(|line| line.starts_with("<script>"))
            .unwrap();
        assert_eq!(
            script,
            r#"<script>window.location.replace("cinebook://payment-result?transactionId=vnpay-1-ab&status=success&amount=150000");</script>"#
        );
    }

    #[test]
    fn script_string_cannot_close_the_element() {
        assert_eq!(script_string("a</script>b"), r#""a<\/script>b""#);
        assert_eq!(script_string(r#"say "hi""#), r#""say \"hi\"""#);
    }
}
