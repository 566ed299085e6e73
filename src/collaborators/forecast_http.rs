//! 预测服务 HTTP 客户端
//!
//! POST {base_url}/forecast，body: {"product_id": .., "horizon_days": ..}，返回 ForecastResult JSON；
//! 404 视为产品不存在。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::collaborators::{CollaboratorError, Forecaster};
use crate::planning::ForecastResult;

#[derive(Serialize)]
struct ForecastRequestBody {
    product_id: u64,
    horizon_days: u32,
}

pub struct HttpForecaster {
    client: Client,
    base_url: String,
}

impl HttpForecaster {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, CollaboratorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CollaboratorError::NotConfigured(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/forecast", self.base_url)
    }
}

#[async_trait]
impl Forecaster for HttpForecaster {
    async fn forecast(
        &self,
        product_id: u64,
        horizon_days: u32,
    ) -> Result<ForecastResult, CollaboratorError> {
        let resp = self
            .client
            .post(self.endpoint())
            .json(&ForecastRequestBody {
                product_id,
                horizon_days,
            })
            .send()
            .await
            .map_err(CollaboratorError::from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CollaboratorError::from_status(
                status,
                &format!("forecast for product {product_id}"),
            ));
        }

        let result: ForecastResult = resp
            .json()
            .await
            .map_err(|e| CollaboratorError::Malformed(e.to_string()))?;
        if result.product_id != product_id {
            return Err(CollaboratorError::Malformed(format!(
                "requested product {product_id}, service answered for {}",
                result.product_id
            )));
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_trims_slash() {
        let f = HttpForecaster::new("http://localhost:8000/", 5).unwrap();
        assert_eq!(f.endpoint(), "http://localhost:8000/forecast");
    }

    #[tokio::test]
    async fn test_unreachable_is_unavailable() {
        // 端口 9 (discard) 通常无服务监听
        let f = HttpForecaster::new("http://127.0.0.1:9", 1).unwrap();
        match f.forecast(1, 7).await {
            Err(CollaboratorError::Unavailable(_)) => {}
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }
}
