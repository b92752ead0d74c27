use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_gateway::{ChargeOutcome, ChargeRequest, PaymentGateway},
};

#[derive(Debug, Deserialize)]
struct GatewayChargeResponse {
    success: bool,
    transaction_ref: Option<String>,
    error_message: Option<String>,
}

/// HTTP payment gateway client.
///
/// Posts charge requests to `<base>/charges` with the idempotency key in a
/// header, so the gateway can deduplicate a retried ambiguous outcome.
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    charge_url: Url,
    api_key: SecretString,
}

impl HttpPaymentGateway {
    pub fn new(base_url: Url, api_key: SecretString, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Internal(format!("failed to build gateway client: {e}")))?;
        let charge_url = base_url
            .join("charges")
            .map_err(|e| AppError::Internal(format!("invalid gateway URL: {e}")))?;
        Ok(Self {
            client,
            charge_url,
            api_key,
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn charge(&self, request: &ChargeRequest) -> AppResult<ChargeOutcome> {
        let response = self
            .client
            .post(self.charge_url.clone())
            .bearer_auth(self.api_key.expose_secret())
            .header("Idempotency-Key", &request.idempotency_key)
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::Gateway(format!("charge request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Gateway(format!("gateway returned {status}")));
        }

        let body: GatewayChargeResponse = response
            .json()
            .await
            .map_err(|e| AppError::Gateway(format!("malformed gateway response: {e}")))?;

        if body.success {
            let transaction_ref = body.transaction_ref.ok_or_else(|| {
                AppError::Gateway("approved charge missing transaction_ref".to_string())
            })?;
            Ok(ChargeOutcome::Approved { transaction_ref })
        } else {
            Ok(ChargeOutcome::Declined {
                reason: body
                    .error_message
                    .unwrap_or_else(|| "payment declined".to_string()),
            })
        }
    }
}
