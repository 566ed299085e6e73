//! Google Directions API 路线估算
//!
//! GET {base_url}/maps/api/directions/json?origin=..&destination=..&mode=..&key=..，
//! 取首条路线的首个 leg 的 distance / duration。

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::collaborators::{CollaboratorError, RoutePlanner};
use crate::planning::{RouteEstimate, TravelMode};

pub const GOOGLE_MAPS_BASE_URL: &str = "https://maps.googleapis.com";

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: TextValue,
    duration: TextValue,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    value: u64,
}

pub struct GoogleMapsRoutePlanner {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoogleMapsRoutePlanner {
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, CollaboratorError> {
        if api_key.trim().is_empty() || api_key == "your_google_maps_api_key" {
            return Err(CollaboratorError::NotConfigured(
                "Google Maps API key is not configured".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CollaboratorError::NotConfigured(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

/// Directions API 的 status 字段归类
fn interpret(
    body: DirectionsResponse,
    origin: &str,
    destination: &str,
    mode: TravelMode,
) -> Result<RouteEstimate, CollaboratorError> {
    let detail = body.error_message.unwrap_or_default();
    match body.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" | "NOT_FOUND" => {
            return Err(CollaboratorError::NoRoute {
                origin: origin.to_string(),
                destination: destination.to_string(),
            })
        }
        "OVER_QUERY_LIMIT" | "UNKNOWN_ERROR" => {
            return Err(CollaboratorError::Unavailable(format!("{} {}", body.status, detail)))
        }
        other => return Err(CollaboratorError::Rejected(format!("{other} {detail}"))),
    }

    let leg = body
        .routes
        .into_iter()
        .next()
        .and_then(|r| r.legs.into_iter().next())
        .ok_or_else(|| CollaboratorError::NoRoute {
            origin: origin.to_string(),
            destination: destination.to_string(),
        })?;

    Ok(RouteEstimate {
        origin: origin.to_string(),
        destination: destination.to_string(),
        mode,
        distance_meters: leg.distance.value,
        distance_text: leg.distance.text,
        duration_seconds: leg.duration.value,
        duration_text: leg.duration.text,
    })
}

#[async_trait]
impl RoutePlanner for GoogleMapsRoutePlanner {
    async fn route(
        &self,
        origin: &str,
        destination: &str,
        mode: TravelMode,
    ) -> Result<RouteEstimate, CollaboratorError> {
        let url = format!("{}/maps/api/directions/json", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("origin", origin),
                ("destination", destination),
                ("mode", mode.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(CollaboratorError::from_reqwest)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CollaboratorError::from_status(status, "directions"));
        }
        let body: DirectionsResponse = resp
            .json()
            .await
            .map_err(|e| CollaboratorError::Malformed(e.to_string()))?;
        interpret(body, origin, destination, mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> DirectionsResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_ok_response() {
        let body = parse(
            r#"{"status":"OK","routes":[{"legs":[{"distance":{"text":"1,234 km","value":1234000},
               "duration":{"text":"12 hours 5 mins","value":43500}}]}]}"#,
        );
        let est = interpret(body, "Chicago", "Denver", TravelMode::Driving).unwrap();
        assert_eq!(est.distance_meters, 1_234_000);
        assert_eq!(est.duration_text, "12 hours 5 mins");
        assert_eq!(est.mode, TravelMode::Driving);
    }

    #[test]
    fn test_zero_results_is_no_route() {
        let body = parse(r#"{"status":"ZERO_RESULTS","routes":[]}"#);
        assert!(matches!(
            interpret(body, "Honolulu", "Tokyo", TravelMode::Driving),
            Err(CollaboratorError::NoRoute { .. })
        ));
    }

    #[test]
    fn test_quota_is_unavailable_and_denied_is_rejected() {
        let body = parse(r#"{"status":"OVER_QUERY_LIMIT"}"#);
        assert!(matches!(
            interpret(body, "a", "b", TravelMode::Walking),
            Err(CollaboratorError::Unavailable(_))
        ));
        let body = parse(r#"{"status":"REQUEST_DENIED","error_message":"bad key"}"#);
        assert!(matches!(
            interpret(body, "a", "b", TravelMode::Walking),
            Err(CollaboratorError::Rejected(_))
        ));
    }

    #[test]
    fn test_placeholder_key_not_configured() {
        assert!(GoogleMapsRoutePlanner::new(GOOGLE_MAPS_BASE_URL, "your_google_maps_api_key", 5).is_err());
        assert!(GoogleMapsRoutePlanner::new(GOOGLE_MAPS_BASE_URL, "", 5).is_err());
    }
}
