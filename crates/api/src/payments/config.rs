//! Provider credentials. A provider whose required variables are unset is
//! disabled: its order endpoint answers 400 and its callbacks are refused.

/// ZaloPay sandbox order endpoint.
pub const ZALOPAY_DEFAULT_ENDPOINT: &str = "https://sb-openapi.zalopay.vn/v2/create";
/// VNPay sandbox payment page.
pub const VNPAY_DEFAULT_URL: &str = "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html";
/// MoMo test create endpoint.
pub const MOMO_DEFAULT_ENDPOINT: &str = "https://test-payment.momo.vn/v2/gateway/api/create";

#[derive(Debug, Clone)]
pub struct ZaloPayConfig {
    pub app_id: String,
    /// Signs order requests.
    pub key1: String,
    /// Verifies callbacks and redirects.
    pub key2: String,
    pub endpoint: String,
    pub callback_url: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone)]
pub struct VnPayConfig {
    pub tmn_code: String,
    pub hash_secret: String,
    pub payment_url: String,
    pub return_url: String,
}

#[derive(Debug, Clone)]
pub struct MoMoConfig {
    pub partner_code: String,
    pub access_key: String,
    pub secret_key: String,
    pub endpoint: String,
    pub ipn_url: String,
    pub redirect_url: String,
}

/// Settings for all three providers.
#[derive(Debug, Clone)]
pub struct PaymentsConfig {
    /// Upper bound on each provider HTTP call (default: `15`).
    pub provider_timeout_secs: u64,
    pub zalopay: Option<ZaloPayConfig>,
    pub vnpay: Option<VnPayConfig>,
    pub momo: Option<MoMoConfig>,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            provider_timeout_secs: 15,
            zalopay: None,
            vnpay: None,
            momo: None,
        }
    }
}

impl PaymentsConfig {
    /// Load provider settings from the environment.
    ///
    /// | Env Var                         | Required | Default                 |
    /// |---------------------------------|----------|-------------------------|
    /// | `PAYMENT_PROVIDER_TIMEOUT_SECS` | no       | `15`                    |
    /// | `ZALOPAY_APP_ID`                | yes      |                         |
    /// | `ZALOPAY_KEY1`, `ZALOPAY_KEY2`  | yes      |                         |
    /// | `ZALOPAY_ENDPOINT`              | no       | sandbox                 |
    /// | `ZALOPAY_CALLBACK_URL`          | yes      |                         |
    /// | `ZALOPAY_REDIRECT_URL`          | yes      |                         |
    /// | `VNPAY_TMN_CODE`                | yes      |                         |
    /// | `VNPAY_HASH_SECRET`             | yes      |                         |
    /// | `VNPAY_URL`                     | no       | sandbox                 |
    /// | `VNPAY_RETURN_URL`              | yes      |                         |
    /// | `MOMO_PARTNER_CODE`             | yes      |                         |
    /// | `MOMO_ACCESS_KEY`               | yes      |                         |
    /// | `MOMO_SECRET_KEY`               | yes      |                         |
    /// | `MOMO_ENDPOINT`                 | no       | test environment        |
    /// | `MOMO_IPN_URL`                  | yes      |                         |
    /// | `MOMO_REDIRECT_URL`             | yes      |                         |
    pub fn from_env() -> Self {
        let provider_timeout_secs: u64 = std::env::var("PAYMENT_PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "15".into())
            .parse()
            .expect("PAYMENT_PROVIDER_TIMEOUT_SECS must be a valid u64");

        let zalopay = (|| {
            Some(ZaloPayConfig {
                app_id: env("ZALOPAY_APP_ID")?,
                key1: env("ZALOPAY_KEY1")?,
                key2: env("ZALOPAY_KEY2")?,
                endpoint: env("ZALOPAY_ENDPOINT")
                    .unwrap_or_else(|| ZALOPAY_DEFAULT_ENDPOINT.into()),
                callback_url: env("ZALOPAY_CALLBACK_URL")?,
                redirect_url: env("ZALOPAY_REDIRECT_URL")?,
            })
        })();

        let vnpay = (|| {
            Some(VnPayConfig {
                tmn_code: env("VNPAY_TMN_CODE")?,
                hash_secret: env("VNPAY_HASH_SECRET")?,
                payment_url: env("VNPAY_URL").unwrap_or_else(|| VNPAY_DEFAULT_URL.into()),
                return_url: env("VNPAY_RETURN_URL")?,
            })
        })();

        let momo = (|| {
            Some(MoMoConfig {
                partner_code: env("MOMO_PARTNER_CODE")?,
                access_key: env("MOMO_ACCESS_KEY")?,
                secret_key: env("MOMO_SECRET_KEY")?,
                endpoint: env("MOMO_ENDPOINT").unwrap_or_else(|| MOMO_DEFAULT_ENDPOINT.into()),
                ipn_url: env("MOMO_IPN_URL")?,
                redirect_url: env("MOMO_REDIRECT_URL")?,
            })
        })();

        for (name, enabled) in [
            ("zalopay", zalopay.is_some()),
            ("vnpay", vnpay.is_some()),
            ("momo", momo.is_some()),
        ] {
            if !enabled {
                tracing::warn!(provider = name, "Payment provider not configured, disabled");
            }
        }

        Self {
            provider_timeout_secs,
            zalopay,
            vnpay,
            momo,
        }
    }
}

/// A non-empty environment variable.
fn env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
