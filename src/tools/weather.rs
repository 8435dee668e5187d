//! Weather lookup tool
//!
//! Queries a wttr.in-compatible service (`GET {base}/{city}?format=j1`) and
//! condenses the current conditions into one line the model can read.

use crate::config::WeatherConfig;
use crate::error::{Result, TutorbotError};
use crate::tools::{Tool, ToolExecutor, ToolResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Name the model uses to call this tool
pub const TOOL_NAME: &str = "get_weather";

/// Current-weather lookup
#[derive(Debug, Clone)]
pub struct WeatherTool {
    client: Client,
    api_base: Url,
}

#[derive(Debug, Deserialize)]
struct WeatherReport {
    #[serde(default)]
    current_condition: Vec<CurrentCondition>,
}

#[derive(Debug, Deserialize)]
struct CurrentCondition {
    #[serde(rename = "temp_C")]
    temp_c: String,
    #[serde(rename = "FeelsLikeC")]
    feels_like_c: String,
    #[serde(rename = "windspeedKmph")]
    windspeed_kmph: String,
    #[serde(rename = "weatherDesc", default)]
    weather_desc: Vec<ValueField>,
}

#[derive(Debug, Deserialize)]
struct ValueField {
    value: String,
}

impl CurrentCondition {
    fn summary(&self, city: &str) -> String {
        let description = self
            .weather_desc
            .first()
            .map(|d| d.value.trim())
            .filter(|d| !d.is_empty())
            .unwrap_or("Unknown");
        format!(
            "Current weather in {}: {}, temperature {}°C, feels like {}°C, wind {} km/h",
            city, description, self.temp_c, self.feels_like_c, self.windspeed_kmph
        )
    }
}

impl WeatherTool {
    /// Create the tool from configuration
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client cannot be built
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let api_base = Url::parse(&config.api_base).map_err(|e| {
            TutorbotError::Config(format!("Invalid weather api_base {}: {}", config.api_base, e))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(TutorbotError::Config(format!(
                "Weather api_base cannot be used as a base URL: {}",
                config.api_base
            ))
            .into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("tutorbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TutorbotError::Tool(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, api_base })
    }

    /// URL for a city lookup; the city is percent-encoded as one path segment
    pub fn lookup_url(&self, city: &str) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(city);
        }
        url.query_pairs_mut().clear().append_pair("format", "j1");
        url
    }

    /// Fetch current conditions and summarize them
    ///
    /// # Errors
    ///
    /// Returns error on transport failure, a non-success status, or an
    /// unexpected body
    pub async fn current_weather(&self, city: &str) -> Result<String> {
        let url = self.lookup_url(city);
        tracing::debug!("Fetching weather: {}", url);

        let response = self.client.get(url).send().await?.error_for_status()?;
        let report: WeatherReport = response.json().await?;
        let condition = report.current_condition.first().ok_or_else(|| {
            TutorbotError::Tool("weather service returned no current conditions".to_string())
        })?;

        Ok(condition.summary(city))
    }

    /// Weather summary, or a failure message if the lookup did not work
    pub async fn report(&self, city: &str) -> String {
        match self.current_weather(city).await {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!("Weather lookup for {} failed: {}", city, e);
                format!("Failed to fetch weather information: {}", e)
            }
        }
    }
}

#[async_trait]
impl ToolExecutor for WeatherTool {
    fn tool_definition(&self) -> Tool {
        Tool::new(
            TOOL_NAME,
            "Get the current weather for a city.",
            serde_json::json!({
                "type": "object",
                "properties": {
                    "city": {
                        "type": "string",
                        "description": "City name, for example Seoul"
                    }
                },
                "required": ["city"]
            }),
        )
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolResult> {
        let city = args
            .get("city")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|c| !c.is_empty());

        match city {
            Some(city) => Ok(ToolResult::success(self.report(city).await)),
            None => Ok(ToolResult::error("Missing required argument: city")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(base: &str) -> WeatherTool {
        WeatherTool::new(&WeatherConfig {
            api_base: base.to_string(),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_lookup_url() {
        let url = tool("https://wttr.in").lookup_url("Seoul");
        assert_eq!(url.as_str(), "https://wttr.in/Seoul?format=j1");
    }

    #[test]
    fn test_lookup_url_encodes_city() {
        let url = tool("http://localhost:8080/weather/").lookup_url("New York");
        assert_eq!(url.as_str(), "http://localhost:8080/weather/New%20York?format=j1");
    }

    #[test]
    fn test_invalid_base_rejected() {
        let result = WeatherTool::new(&WeatherConfig {
            api_base: "not a url".to_string(),
            timeout_seconds: 5,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_definition() {
        let definition = tool("https://wttr.in").tool_definition();
        assert_eq!(definition.name, "get_weather");
        assert_eq!(definition.parameters["required"][0], "city");
    }

    #[test]
    fn test_summary_format() {
        let condition: CurrentCondition = serde_json::from_value(serde_json::json!({
            "temp_C": "21",
            "FeelsLikeC": "20",
            "windspeedKmph": "11",
            "weatherDesc": [{"value": "Partly cloudy"}]
        }))
        .unwrap();
        assert_eq!(
            condition.summary("Seoul"),
            "Current weather in Seoul: Partly cloudy, temperature 21°C, feels like 20°C, wind 11 km/h"
        );
    }

    #[tokio::test]
    async fn test_execute_missing_city_is_soft_error() {
        let result = tool("https://wttr.in")
            .execute(serde_json::json!({}))
            .await
            .unwrap();
        assert!(!result.success);
        assert_eq!(result.to_message(), "Error: Missing required argument: city");
    }
}
