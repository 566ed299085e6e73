//! Inventory Optimizer 工具：以 DemandSummary 为输入求解补货量
//!
//! 库存与成本参数可随请求给出，缺省时取配置 [planning] 中的默认值。

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::config::PlanningSection;
use crate::planning::{optimize_inventory, DemandSummary, InventoryPlan, InventoryRequest};
use crate::tools::{Tool, ToolError, INVENTORY_OPTIMIZER};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct InventoryOptimizeInput {
    /// Demand Forecaster 的输出，原样传入
    pub demand: DemandSummary,
    /// 当前库存（件），缺省取配置值
    #[serde(default)]
    pub current_stock: Option<i64>,
    /// 每件每期持有成本，缺省取配置值
    #[serde(default)]
    pub holding_cost_rate: Option<f64>,
    /// 单次下单固定成本，缺省取配置值
    #[serde(default)]
    pub order_cost: Option<f64>,
}

pub struct InventoryOptimizerTool {
    defaults: PlanningSection,
}

impl InventoryOptimizerTool {
    pub fn new(defaults: PlanningSection) -> Self {
        Self { defaults }
    }
}

#[async_trait]
impl Tool for InventoryOptimizerTool {
    type Input = InventoryOptimizeInput;
    type Output = InventoryPlan;

    fn name(&self) -> &str {
        INVENTORY_OPTIMIZER
    }

    fn description(&self) -> &str {
        "Calculate the cost-optimal reorder quantity for a product so that stock covers forecasted \
         demand. Input: {\"demand\": <DemandSummary from the Demand Forecaster>, optional \
         \"current_stock\", \"holding_cost_rate\", \"order_cost\"}. Returns an InventoryPlan."
    }

    async fn invoke(&self, input: InventoryOptimizeInput) -> Result<InventoryPlan, ToolError> {
        let req = InventoryRequest {
            product_id: input.demand.product_id,
            demand: input.demand.total_units,
            current_stock: input.current_stock.unwrap_or(self.defaults.current_stock),
            holding_cost_rate: input
                .holding_cost_rate
                .unwrap_or(self.defaults.holding_cost_rate),
            order_cost: input.order_cost.unwrap_or(self.defaults.order_cost),
        };
        optimize_inventory(&req)
    }
}
