//! 规划核心：数据模型、预测摘要适配、库存优化引擎

pub mod demand;
pub mod optimizer;
pub mod types;

pub use demand::summarize_demand;
pub use optimizer::{optimize_inventory, FixedChargeModel, InventoryRequest};
pub use types::{
    DemandSummary, DisruptionSignal, ForecastPoint, ForecastResult, InventoryPlan, RouteEstimate,
    TravelMode,
};
