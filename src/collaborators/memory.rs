//! 内存协作方（测试与离线演示用，无需网络）
//!
//! 可注入瞬时故障次数，用于验证 UpstreamUnavailable 的重试路径。

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::collaborators::{CollaboratorError, DisruptionScanner, Forecaster, RoutePlanner};
use crate::planning::{DisruptionSignal, ForecastResult, RouteEstimate, TravelMode};

/// 前 N 次调用返回 Unavailable，之后正常
#[derive(Debug, Default)]
struct TransientFaults {
    remaining: AtomicUsize,
    calls: AtomicUsize,
}

impl TransientFaults {
    fn hit(&self, what: &str) -> Result<(), CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.remaining.load(Ordering::SeqCst);
        if left > 0 {
            self.remaining.store(left - 1, Ordering::SeqCst);
            return Err(CollaboratorError::Unavailable(format!("{what} temporarily down")));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryForecaster {
    series: HashMap<u64, ForecastResult>,
    faults: TransientFaults,
}

impl InMemoryForecaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, forecast: ForecastResult) -> Self {
        self.series.insert(forecast.product_id, forecast);
        self
    }

    pub fn with_transient_failures(self, n: usize) -> Self {
        self.faults.remaining.store(n, Ordering::SeqCst);
        self
    }

    /// 累计调用次数（含失败）
    pub fn calls(&self) -> usize {
        self.faults.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Forecaster for InMemoryForecaster {
    async fn forecast(
        &self,
        product_id: u64,
        horizon_days: u32,
    ) -> Result<ForecastResult, CollaboratorError> {
        self.faults.hit("forecasting service")?;
        let mut f = self
            .series
            .get(&product_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(format!("no sales history for product {product_id}")))?;
        f.horizon_days = horizon_days;
        Ok(f)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRoutePlanner {
    routes: HashMap<(String, String), (u64, u64)>,
    faults: TransientFaults,
}

impl InMemoryRoutePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一条路线（距离米、时长秒），对所有出行方式生效
    pub fn with_route(
        mut self,
        origin: &str,
        destination: &str,
        distance_meters: u64,
        duration_seconds: u64,
    ) -> Self {
        self.routes.insert(
            (origin.to_lowercase(), destination.to_lowercase()),
            (distance_meters, duration_seconds),
        );
        self
    }

    pub fn with_transient_failures(self, n: usize) -> Self {
        self.faults.remaining.store(n, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> usize {
        self.faults.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoutePlanner for InMemoryRoutePlanner {
    async fn route(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
    ) -> Result<RouteEstimate, CollaboratorError> {
        self.faults.hit("mapping service")?;
        let key = (origin.to_lowercase(), destination.to_lowercase());
        let (distance_meters, duration_seconds) =
            self.routes
                .get(&key)
                .copied()
                .ok_or_else(|| CollaboratorError::NoRoute {
                    origin: origin.to_string(),
                    destination: destination.to_string(),
                })?;
        Ok(RouteEstimate {
            origin: origin.to_string(),
            destination: destination.to_string(),
            mode,
            distance_meters,
            distance_text: format!("{:.1} km", distance_meters as f64 / 1000.0),
            duration_seconds,
            duration_text: format!("{} mins", duration_seconds / 60),
        })
    }
}

/// 按调用顺序回放头条：第 i 次 scan 返回队列中第 i 批（队列耗尽后返回空）
#[derive(Debug, Default)]
pub struct InMemoryDisruptionScanner {
    batches: Mutex<VecDeque<Vec<String>>>,
    queries: Mutex<Vec<String>>,
}

impl InMemoryDisruptionScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch<I, S>(self, headlines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(headlines.into_iter().map(Into::into).collect());
        self
    }

    /// 收到过的查询关键词（按调用顺序）
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl DisruptionScanner for InMemoryDisruptionScanner {
    async fn scan(&self, keywords: &str) -> Result<Vec<DisruptionSignal>, CollaboratorError> {
        self.queries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(keywords.to_string());
        let batch = self
            .batches
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_default();
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![DisruptionSignal::new(keywords, batch)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_transient_failures_then_success() {
        let f = InMemoryForecaster::new()
            .with_series(ForecastResult {
                product_id: 7,
                horizon_days: 0,
                history_end: None,
                points: vec![],
            })
            .with_transient_failures(2);
        assert!(matches!(f.forecast(7, 3).await, Err(CollaboratorError::Unavailable(_))));
        assert!(matches!(f.forecast(7, 3).await, Err(CollaboratorError::Unavailable(_))));
        let ok = f.forecast(7, 3).await.unwrap();
        assert_eq!(ok.horizon_days, 3);
        assert_eq!(f.calls(), 3);
    }

    #[tokio::test]
    async fn test_unknown_product_not_found() {
        let f = InMemoryForecaster::new();
        assert!(matches!(f.forecast(1, 3).await, Err(CollaboratorError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_route_case_insensitive() {
        let r = InMemoryRoutePlanner::new().with_route("Shanghai", "Ningbo", 220_000, 10_800);
        let est = r.route("shanghai", "NINGBO", TravelMode::Driving).await.unwrap();
        assert_eq!(est.distance_meters, 220_000);
        assert_eq!(est.duration_text, "180 mins");
        assert!(r.route("Ningbo", "Shanghai", TravelMode::Driving).await.is_err());
    }

    #[tokio::test]
    async fn test_scanner_replays_batches() {
        let s = InMemoryDisruptionScanner::new()
            .with_batch(Vec::<String>::new())
            .with_batch(["Port strike in Rotterdam"]);
        assert!(s.scan("port").await.unwrap().is_empty());
        let signals = s.scan("port").await.unwrap();
        assert_eq!(signals[0].headlines, vec!["Port strike in Rotterdam".to_string()]);
        assert!(s.scan("port").await.unwrap().is_empty());
        assert_eq!(s.queries().len(), 3);
    }
}
