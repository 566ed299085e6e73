pub mod demand_forecaster;
pub mod disruption_monitor;
pub mod error;
pub mod executor;
pub mod inventory_optimizer;
pub mod logistics_planner;
pub mod registry;
pub mod schema;

pub use demand_forecaster::{DemandForecastInput, DemandForecasterTool, MAX_FORECAST_DAYS};
pub use disruption_monitor::{DisruptionMonitorTool, DisruptionQuery, DisruptionReport};
pub use error::{ToolError, ToolErrorKind};
pub use executor::{ExecutionReport, ToolExecutor};
pub use inventory_optimizer::{InventoryOptimizeInput, InventoryOptimizerTool};
pub use logistics_planner::{LogisticsPlannerTool, RouteInput};
pub use registry::{DynTool, Tool, ToolRegistry, ToolSpec};
pub use schema::{decision_schema_json, schema_value};

pub const DEMAND_FORECASTER: &str = "Demand Forecaster";
pub const INVENTORY_OPTIMIZER: &str = "Inventory Optimizer";
pub const LOGISTICS_PLANNER: &str = "Logistics Planner";
pub const DISRUPTION_MONITOR: &str = "Disruption Monitor";
