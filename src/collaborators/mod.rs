//! 外部协作方：预测服务、地图服务、中断扫描
//!
//! 核心只依赖这里的三个 trait；具体实现（HTTP / CSV 基线 / 内存）由 AgentBuilder 按配置选择。

pub mod csv_forecaster;
pub mod forecast_http;
pub mod maps;
pub mod memory;
pub mod news;

use async_trait::async_trait;
use thiserror::Error;

use crate::planning::{DisruptionSignal, ForecastResult, RouteEstimate, TravelMode};

pub use csv_forecaster::CsvBaselineForecaster;
pub use forecast_http::HttpForecaster;
pub use maps::GoogleMapsRoutePlanner;
pub use memory::{InMemoryDisruptionScanner, InMemoryForecaster, InMemoryRoutePlanner};
pub use news::NewsApiScanner;

/// 协作方错误（由工具层映射为 ToolError）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("no route found from {origin} to {destination}")]
    NoRoute { origin: String, destination: String },

    #[error("upstream rejected request: {0}")]
    Rejected(String),

    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    #[error("malformed upstream payload: {0}")]
    Malformed(String),

    #[error("collaborator not configured: {0}")]
    NotConfigured(String),
}

impl CollaboratorError {
    /// reqwest 错误归类：超时 / 连接失败 / 5xx 视为不可用，其余 4xx 视为拒绝
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            return CollaboratorError::Unavailable(err.to_string());
        }
        if err.is_decode() {
            return CollaboratorError::Malformed(err.to_string());
        }
        match err.status() {
            Some(s) if s.is_server_error() || s.as_u16() == 429 => {
                CollaboratorError::Unavailable(err.to_string())
            }
            Some(_) => CollaboratorError::Rejected(err.to_string()),
            None => CollaboratorError::Unavailable(err.to_string()),
        }
    }

    /// HTTP 状态码归类（非 2xx）
    pub fn from_status(status: reqwest::StatusCode, context: &str) -> Self {
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            CollaboratorError::Unavailable(format!("{context}: HTTP {status}"))
        } else if status == reqwest::StatusCode::NOT_FOUND {
            CollaboratorError::NotFound(context.to_string())
        } else {
            CollaboratorError::Rejected(format!("{context}: HTTP {status}"))
        }
    }
}

/// 需求预测服务
#[async_trait]
pub trait Forecaster: Send + Sync {
    async fn forecast(
        &self,
        product_id: u64,
        horizon_days: u32,
    ) -> Result<ForecastResult, CollaboratorError>;
}

/// 路线估算服务
#[async_trait]
pub trait RoutePlanner: Send + Sync {
    async fn route(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
    ) -> Result<RouteEstimate, CollaboratorError>;
}

/// 中断信号扫描（可返回空列表）
#[async_trait]
pub trait DisruptionScanner: Send + Sync {
    async fn scan(&self, keywords: &str) -> Result<Vec<DisruptionSignal>, CollaboratorError>;
}
