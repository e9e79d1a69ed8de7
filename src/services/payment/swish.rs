use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde_json::json;

use super::{PaymentGateway, PaymentHandle, PaymentRequest, PaymentStatus};
use crate::config::AppConfig;

pub struct SwishGateway {
    api_url: String,
    payee_alias: String,
    callback_url: String,
    return_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct PaymentRequestStatus {
    status: String,
}

impl SwishGateway {
    pub fn new(
        api_url: String,
        payee_alias: String,
        callback_url: String,
        return_url: String,
        identity: reqwest::Identity,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .identity(identity)
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build Swish HTTP client")?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            payee_alias,
            callback_url,
            return_url,
            client,
        })
    }

    /// `None` when no client certificate is configured.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Option<Self>> {
        if config.swish_cert_path.is_empty() {
            return Ok(None);
        }

        let der = std::fs::read(&config.swish_cert_path)
            .with_context(|| format!("failed to read Swish certificate {}", config.swish_cert_path))?;
        let identity = reqwest::Identity::from_pkcs12_der(&der, &config.swish_cert_password)
            .context("failed to load Swish certificate")?;

        Self::new(
            config.swish_api_url.clone(),
            config.swish_payee_alias.clone(),
            config.swish_callback_url.clone(),
            config.swish_return_url.clone(),
            identity,
        )
        .map(Some)
    }

    fn app_uri(&self, token: &str) -> String {
        let mut params = vec![("token", token)];
        if !self.return_url.is_empty() {
            params.push(("callbackurl", self.return_url.as_str()));
        }
        reqwest::Url::parse_with_params("swish://paymentrequest", &params)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("swish://paymentrequest?token={token}"))
    }
}

#[async_trait]
impl PaymentGateway for SwishGateway {
    async fn create_payment_request(&self, request: &PaymentRequest) -> anyhow::Result<PaymentHandle> {
        let url = format!("{}/api/v2/paymentrequests/{}", self.api_url, request.payment_id);

        // no payerAlias: the m-commerce flow hands back a token for the app
        let body = json!({
            "payeePaymentReference": request.reference,
            "callbackUrl": self.callback_url,
            "payeeAlias": self.payee_alias,
            "amount": format!("{}.00", request.amount),
            "currency": "SEK",
            "message": request.message,
        });

        let resp = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .context("failed to call Swish API")?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("Swish API error ({status}): {text}");
        }

        let token = resp
            .headers()
            .get("paymentrequesttoken")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("missing PaymentRequestToken in Swish response"))?;

        Ok(PaymentHandle {
            qr_code: self.app_uri(&token),
            payment_request_token: token,
        })
    }

    async fn payment_status(&self, payment_id: &str) -> anyhow::Result<PaymentStatus> {
        let url = format!("{}/api/v1/paymentrequests/{}", self.api_url, payment_id);

        let data: PaymentRequestStatus = self
            .client
            .get(&url)
            .send()
            .await
            .context("failed to call Swish API")?
            .error_for_status()
            .context("Swish API returned error")?
            .json()
            .await
            .context("failed to parse Swish status")?;

        Ok(PaymentStatus::parse(&data.status))
    }

    async fn cancel_payment_request(&self, payment_id: &str) -> anyhow::Result<()> {
        let url = format!("{}/api/v1/paymentrequests/{}", self.api_url, payment_id);
        let patch = json!([{ "op": "replace", "path": "/status", "value": "cancelled" }]);

        self.client
            .patch(&url)
            .header(CONTENT_TYPE, "application/json-patch+json")
            .body(patch.to_string())
            .send()
            .await
            .context("failed to cancel Swish payment request")?
            .error_for_status()
            .context("Swish API returned error")?;

        Ok(())
    }
}
