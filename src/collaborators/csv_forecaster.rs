//! CSV 历史销量基线预测
//!
//! 读取 `date,product_id,sales_units` 数据集，按产品聚合每日销量。预测 = 近 window_days 天均值 × 星期系数，
//! 区间为 ±1.96σ。输出与预测服务一致：历史拟合段 + 未来 horizon 段，history_end 为最后观测日。

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDate};
use serde::Deserialize;

use crate::collaborators::{CollaboratorError, Forecaster};
use crate::planning::{ForecastPoint, ForecastResult};

const Z_95: f64 = 1.96;

#[derive(Debug, Deserialize)]
struct SalesRecord {
    date: NaiveDate,
    product_id: u64,
    sales_units: f64,
}

#[derive(Debug)]
pub struct CsvBaselineForecaster {
    /// product_id -> 按日期排序的每日销量
    history: HashMap<u64, Vec<(NaiveDate, f64)>>,
    window_days: usize,
}

impl CsvBaselineForecaster {
    pub fn from_path(path: &Path, window_days: usize) -> Result<Self, CollaboratorError> {
        let file = std::fs::File::open(path).map_err(|e| {
            CollaboratorError::NotConfigured(format!("{}: {e}", path.display()))
        })?;
        Self::from_reader(file, window_days)
    }

    pub fn from_reader<R: std::io::Read>(
        reader: R,
        window_days: usize,
    ) -> Result<Self, CollaboratorError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut daily: HashMap<u64, BTreeMap<NaiveDate, f64>> = HashMap::new();
        for record in rdr.deserialize::<SalesRecord>() {
            let r = record.map_err(|e| CollaboratorError::Malformed(e.to_string()))?;
            *daily
                .entry(r.product_id)
                .or_default()
                .entry(r.date)
                .or_insert(0.0) += r.sales_units;
        }

        let history = daily
            .into_iter()
            .map(|(id, days)| (id, days.into_iter().collect()))
            .collect::<HashMap<_, Vec<_>>>();
        tracing::info!(products = history.len(), "Loaded sales history");

        Ok(Self {
            history,
            window_days: window_days.max(1),
        })
    }

    pub fn product_count(&self) -> usize {
        self.history.len()
    }

    fn build(
        &self,
        product_id: u64,
        horizon_days: u32,
        days: &[(NaiveDate, f64)],
    ) -> Result<ForecastResult, CollaboratorError> {
        let n = days.len() as f64;
        let overall = days.iter().map(|(_, v)| v).sum::<f64>() / n;

        // 星期系数：该星期几均值 / 总均值
        let mut by_weekday = [(0.0f64, 0usize); 7];
        for (d, v) in days {
            let slot = &mut by_weekday[d.weekday().num_days_from_monday() as usize];
            slot.0 += v;
            slot.1 += 1;
        }
        let factor = |d: NaiveDate| -> f64 {
            let (sum, cnt) = by_weekday[d.weekday().num_days_from_monday() as usize];
            if cnt == 0 || overall <= 0.0 {
                1.0
            } else {
                (sum / cnt as f64) / overall
            }
        };

        let window = &days[days.len().saturating_sub(self.window_days)..];
        let w = window.len() as f64;
        let base = window.iter().map(|(_, v)| v).sum::<f64>() / w;
        let variance = window.iter().map(|(_, v)| (v - base).powi(2)).sum::<f64>() / w;
        let band = Z_95 * variance.sqrt();

        let point = |date: NaiveDate, level: f64| {
            let est = level * factor(date);
            ForecastPoint {
                date,
                point_estimate: est,
                lower_bound: est - band,
                upper_bound: est + band,
            }
        };

        let mut points: Vec<ForecastPoint> = days.iter().map(|(d, _)| point(*d, overall)).collect();
        let last = days[days.len() - 1].0;
        for i in 1..=i64::from(horizon_days) {
            let date = last.checked_add_signed(Duration::days(i)).ok_or_else(|| {
                CollaboratorError::Rejected(format!(
                    "forecast horizon of {horizon_days} days after {last} is outside the supported date range"
                ))
            })?;
            points.push(point(date, base));
        }

        Ok(ForecastResult {
            product_id,
            horizon_days,
            history_end: Some(last),
            points,
        })
    }
}

#[async_trait]
impl Forecaster for CsvBaselineForecaster {
    async fn forecast(
        &self,
        product_id: u64,
        horizon_days: u32,
    ) -> Result<ForecastResult, CollaboratorError> {
        let days = self
            .history
            .get(&product_id)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| CollaboratorError::NotFound(format!("no sales history for product {product_id}")))?;
        self.build(product_id, horizon_days, days)
    }
}
