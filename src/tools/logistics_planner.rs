//! Logistics Planner 工具：两地间距离与行程时间

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use crate::collaborators::RoutePlanner;
use crate::planning::{RouteEstimate, TravelMode};
use crate::tools::{Tool, ToolError, LOGISTICS_PLANNER};

#[derive(Debug, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct RouteInput {
    pub origin: String,
    pub destination: String,
    /// driving / walking / bicycling / transit，缺省为配置值
    #[serde(default)]
    pub mode: Option<TravelMode>,
}

pub struct LogisticsPlannerTool {
    planner: Arc<dyn RoutePlanner>,
    default_mode: TravelMode,
}

impl LogisticsPlannerTool {
    pub fn new(planner: Arc<dyn RoutePlanner>, default_mode: TravelMode) -> Self {
        Self {
            planner,
            default_mode,
        }
    }
}

#[async_trait]
impl Tool for LogisticsPlannerTool {
    type Input = RouteInput;
    type Output = RouteEstimate;

    fn name(&self) -> &str {
        LOGISTICS_PLANNER
    }

    fn description(&self) -> &str {
        "Find the distance and travel time between two locations, for planning shipping and \
         delivery routes. Input: {\"origin\": <place>, \"destination\": <place>, optional \"mode\": \
         \"driving\"|\"walking\"|\"bicycling\"|\"transit\"}."
    }

    async fn invoke(&self, input: RouteInput) -> Result<RouteEstimate, ToolError> {
        let origin = input.origin.trim();
        let destination = input.destination.trim();
        if origin.is_empty() || destination.is_empty() {
            return Err(ToolError::invalid_input("origin and destination must be non-empty"));
        }
        let mode = input.mode.unwrap_or(self.default_mode);
        Ok(self.planner.route(origin, destination, mode).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::InMemoryRoutePlanner;
    use crate::tools::ToolErrorKind;

    fn tool() -> LogisticsPlannerTool {
        let planner = InMemoryRoutePlanner::new().with_route("Chicago", "Denver", 1_610_000, 52_000);
        LogisticsPlannerTool::new(Arc::new(planner), TravelMode::Driving)
    }

    #[tokio::test]
    async fn test_route_with_default_mode() {
        let est = tool()
            .invoke(RouteInput {
                origin: " Chicago ".into(),
                destination: "Denver".into(),
                mode: None,
            })
            .await
            .unwrap();
        assert_eq!(est.mode, TravelMode::Driving);
        assert_eq!(est.origin, "Chicago");
        assert_eq!(est.distance_meters, 1_610_000);
    }

    #[tokio::test]
    async fn test_no_route_rejected() {
        let err = tool()
            .invoke(RouteInput {
                origin: "Chicago".into(),
                destination: "Honolulu".into(),
                mode: Some(TravelMode::Driving),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::UpstreamRejected);
    }

    #[tokio::test]
    async fn test_blank_origin_invalid() {
        let err = tool()
            .invoke(RouteInput {
                origin: "  ".into(),
                destination: "Denver".into(),
                mode: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, ToolErrorKind::InvalidInput);
    }
}
