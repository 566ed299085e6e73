//! 规划数据模型
//!
//! 全部类型可序列化并带 JsonSchema，作为工具之间传递的结构化载荷（替代从自由文本中解析数字）。

use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 预测序列中的一点（日期、点估计、上下界）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub point_estimate: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// 预测服务返回结果：历史拟合段 + 未来段，按日期升序
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForecastResult {
    pub product_id: u64,
    pub horizon_days: u32,
    /// 最后一个历史观测日；晚于它的点视为未来点。为 None 时全部视为未来点
    #[serde(default)]
    pub history_end: Option<NaiveDate>,
    pub points: Vec<ForecastPoint>,
}

impl ForecastResult {
    /// 未来点个数
    pub fn future_len(&self) -> usize {
        match self.history_end {
            Some(end) => self.points.iter().filter(|p| p.date > end).count(),
            None => self.points.len(),
        }
    }
}

/// 预测摘要：total_units = floor(Σ point_estimate)，仅覆盖最后 horizon_days 个点
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DemandSummary {
    pub product_id: u64,
    pub horizon_days: u32,
    pub total_units: i64,
    pub period_end_date: NaiveDate,
}

/// 库存计划（一次求解一个，创建后不再修改）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InventoryPlan {
    pub product_id: u64,
    pub current_stock: i64,
    pub holding_cost_rate: f64,
    pub order_cost: f64,
    pub forecasted_demand: i64,
    pub reorder_quantity: u64,
    /// 二元决策变量 b：是否下单
    pub order_placed: bool,
    pub total_cost: f64,
}

/// 出行方式（与 Directions API 的 mode 参数一致）
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Transit => "transit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "driving" => Some(TravelMode::Driving),
            "walking" => Some(TravelMode::Walking),
            "bicycling" => Some(TravelMode::Bicycling),
            "transit" => Some(TravelMode::Transit),
            _ => None,
        }
    }
}

/// 路线估算
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RouteEstimate {
    pub origin: String,
    pub destination: String,
    pub mode: TravelMode,
    pub distance_meters: u64,
    pub distance_text: String,
    pub duration_seconds: u64,
    pub duration_text: String,
}

/// 中断信号：一次关键词扫描得到的头条
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DisruptionSignal {
    pub query_keywords: String,
    pub headlines: Vec<String>,
    pub observed_at: DateTime<Utc>,
}

impl DisruptionSignal {
    pub fn new(query_keywords: impl Into<String>, headlines: Vec<String>) -> Self {
        Self {
            query_keywords: query_keywords.into(),
            headlines,
            observed_at: Utc::now(),
        }
    }
}
