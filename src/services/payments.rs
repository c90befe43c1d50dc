//! Payment gateway integration (Razorpay orders)

use std::time::Duration;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use uuid::Uuid;
use crate::config::PaymentsConfig;
use crate::utils::errors::{CampusEventsError, Result};
use crate::utils::logging::log_api_error;

/// Order created at the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    /// Amount in the smallest currency unit
    pub amount: i64,
    pub currency: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(&self, amount_paise: i64, currency: &str, receipt: &str) -> Result<GatewayOrder>;

    /// Key the checkout widget is opened with
    fn public_key(&self) -> &str;
}

/// Convert a price in rupees to paise
pub fn to_paise(price: f64) -> i64 {
    (price * 100.0).round() as i64
}

/// Gateway receipts are limited to 40 characters
pub fn receipt_for(registration_id: Uuid) -> String {
    format!("reg_{}", registration_id.simple())
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorBody {
    error: RazorpayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorDetail {
    #[serde(default)]
    description: Option<String>,
}

#[derive(Clone)]
pub struct RazorpayGateway {
    client: reqwest::Client,
    api_url: String,
    key_id: String,
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(config: &PaymentsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            key_id: config.razorpay_key_id.clone(),
            key_secret: config.razorpay_key_secret.clone(),
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(&self, amount_paise: i64, currency: &str, receipt: &str) -> Result<GatewayOrder> {
        let url = format!("{}/v1/orders", self.api_url);
        debug!(amount = amount_paise, currency = %currency, receipt = %receipt, "Creating gateway order");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&CreateOrderBody {
                amount: amount_paise,
                currency,
                receipt,
            })
            .send()
            .await
            .map_err(|e| {
                log_api_error("razorpay", &e.to_string(), Some(receipt));
                if e.is_timeout() {
                    CampusEventsError::ServiceUnavailable("Payment gateway timed out".to_string())
                } else {
                    CampusEventsError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<RazorpayErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error.description)
                .unwrap_or_else(|| status.to_string());
            error!(status = status.as_u16(), detail = %detail, "Gateway rejected order");
            return Err(CampusEventsError::PaymentGateway(detail));
        }

        let order: GatewayOrder = response.json().await?;
        info!(order_id = %order.id, amount = order.amount, "Gateway order created");
        Ok(order)
    }

    fn public_key(&self) -> &str {
        &self.key_id
    }
}
