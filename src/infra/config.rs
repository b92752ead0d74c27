use std::net::SocketAddr;

use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;
use url::Url;

pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    /// Base URL of the payment gateway; charges POST to `<base>/charges`.
    pub gateway_url: Url,
    pub gateway_api_key: SecretString,
    /// Gateway calls that exceed this count as failures for retry
    /// accounting.
    pub gateway_timeout_secs: u64,
    pub billing_currency: String,
    /// Recurring billing + renewal scheduler interval.
    pub billing_poll_secs: u64,
    /// Failed-payment retry scheduler interval.
    pub retry_poll_secs: u64,
    pub max_concurrent_charges: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = get_env_default("BIND_ADDR", "127.0.0.1:3002".parse().unwrap());
        let database_url: String = get_env("DATABASE_URL");
        let gateway_url: Url = get_env("PAYMENT_GATEWAY_URL");
        let gateway_api_key: SecretString =
            SecretString::new(get_env::<String>("PAYMENT_GATEWAY_API_KEY").into());
        let gateway_timeout_secs: u64 = get_env_default("PAYMENT_GATEWAY_TIMEOUT_SECS", 30);
        let billing_currency: String = get_env_default("BILLING_CURRENCY", "usd".to_string());
        let billing_poll_secs: u64 = get_env_default("BILLING_POLL_SECS", 3_600);
        let retry_poll_secs: u64 = get_env_default("RETRY_POLL_SECS", 14_400);
        let max_concurrent_charges: usize = get_env_default("MAX_CONCURRENT_CHARGES", 8);

        Self {
            bind_addr,
            database_url,
            gateway_url,
            gateway_api_key,
            gateway_timeout_secs,
            billing_currency,
            billing_poll_secs,
            retry_poll_secs,
            max_concurrent_charges,
        }
    }

    #[cfg(test)]
    pub fn test_defaults() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            database_url: "postgres://localhost/billrun_test".to_string(),
            gateway_url: Url::parse("http://localhost:9099").unwrap(),
            gateway_api_key: SecretString::new("test-key".into()),
            gateway_timeout_secs: 5,
            billing_currency: "usd".to_string(),
            billing_poll_secs: 3_600,
            retry_poll_secs: 14_400,
            max_concurrent_charges: 4,
        }
    }
}
