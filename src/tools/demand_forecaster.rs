//! Demand Forecaster 工具：调用预测服务并把预测序列归约为 DemandSummary

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::collaborators::Forecaster;
use crate::planning::{summarize_demand, DemandSummary};
use crate::tools::{Tool, ToolError, DEMAND_FORECASTER};

/// 单次预测的最大天数（十年）
pub const MAX_FORECAST_DAYS: u32 = 3650;

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct DemandForecastInput {
    /// 产品 ID
    pub product_id: u64,
    /// 向后预测的天数（如 90 表示一个季度），1..=3650
    #[schemars(range(min = 1, max = 3650))]
    pub forecast_days: u32,
}

pub struct DemandForecasterTool {
    forecaster: Arc<dyn Forecaster>,
}

impl DemandForecasterTool {
    pub fn new(forecaster: Arc<dyn Forecaster>) -> Self {
        Self { forecaster }
    }
}

#[async_trait]
impl Tool for DemandForecasterTool {
    type Input = DemandForecastInput;
    type Output = DemandSummary;

    fn name(&self) -> &str {
        DEMAND_FORECASTER
    }

    fn description(&self) -> &str {
        "Forecast future sales demand for a specific product ID. Input: {\"product_id\": <int>, \
         \"forecast_days\": <int>}. Returns a DemandSummary with total forecasted units over the \
         horizon; pass it unchanged as \"demand\" to the Inventory Optimizer."
    }

    async fn invoke(&self, input: DemandForecastInput) -> Result<DemandSummary, ToolError> {
        if input.forecast_days == 0 {
            return Err(ToolError::invalid_input("forecast_days must be at least 1"));
        }
        if input.forecast_days > MAX_FORECAST_DAYS {
            return Err(ToolError::invalid_input(format!(
                "forecast_days must be at most {MAX_FORECAST_DAYS}, got {}",
                input.forecast_days
            )));
        }
        let forecast = self
            .forecaster
            .forecast(input.product_id, input.forecast_days)
            .await?;
        tracing::debug!(
            product_id = input.product_id,
            points = forecast.points.len(),
            future = forecast.future_len(),
            "forecast received"
        );
        summarize_demand(&forecast, input.forecast_days)
    }
}
