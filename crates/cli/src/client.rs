//! API client for the Heal backend

use anyhow::{Context, Result};
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// API client for the Heal backend
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let mut base_url = Url::parse(base_url).context("Invalid API URL")?;
        // Relative joins replace the last segment unless the path ends in '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).context("Invalid path")
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path)?)
            .send()
            .await
            .context("Failed to send request")?;

        parse_success(response).await
    }

    /// Make a GET request, parsing the body whatever the status code
    pub async fn check_status<T: DeserializeOwned>(&self, path: &str) -> Result<(u16, T)> {
        let response = self
            .client
            .get(self.url(path)?)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status().as_u16();
        let body = response.json().await.context("Failed to parse response")?;
        Ok((status, body))
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .client
            .post(self.url(path)?)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        parse_success(response).await
    }

    pub async fn predict_period(&self, user_id: &str, screening_id: &str) -> Result<PredictResponse> {
        let request = PredictRequest {
            user_id: user_id.to_string(),
            screening_id: screening_id.to_string(),
        };
        self.post("api/predict-period", &request).await
    }

    pub async fn landing(&self, user_id: &str) -> Result<Landing> {
        let mut url = self.url("v1/me/landing")?;
        url.query_pairs_mut().append_pair("userId", user_id);
        self.get(url.as_str()).await
    }
}

async fn parse_success<T: DeserializeOwned>(response: Response) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        // Prediction errors carry a JSON envelope, everything else is plain text
        let message = serde_json::from_str::<PredictResponse>(&body)
            .ok()
            .and_then(|r| r.message)
            .unwrap_or(body);
        anyhow::bail!("API error ({}): {}", status, message);
    }

    response.json().await.context("Failed to parse response")
}

// API request and response types

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    pub user_id: String,
    pub screening_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub status: String,
    #[serde(default)]
    pub predicted_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Landing {
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub preferences: Option<Preferences>,
    #[serde(default)]
    pub landing_page_summary: Option<LandingSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default)]
    pub reminder_time: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LandingSummary {
    #[serde(default)]
    pub risk: Option<Risk>,
    #[serde(default)]
    pub heal_journey: Option<String>,
    #[serde(default)]
    pub next_yoga: Option<String>,
    #[serde(default)]
    pub cycle: Option<Cycle>,
    #[serde(default)]
    pub pad_usage: Option<PadUsage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Risk {
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub score: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cycle {
    #[serde(default)]
    pub last_period_start: Option<String>,
    #[serde(default)]
    pub last_period_end: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PadUsage {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_check_timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub components: BTreeMap<String, ComponentHealth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Readiness {
    pub ready: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_keeps_path_prefix() {
        let client = ApiClient::new("http://heal.internal/heal").unwrap();
        assert_eq!(
            client.url("api/predict-period").unwrap().as_str(),
            "http://heal.internal/heal/api/predict-period"
        );

        let client = ApiClient::new("http://heal.internal/heal/").unwrap();
        assert_eq!(
            client.url("healthz").unwrap().as_str(),
            "http://heal.internal/heal/healthz"
        );

        let client = ApiClient::new("http://localhost:8080").unwrap();
        assert_eq!(
            client.url("readyz").unwrap().as_str(),
            "http://localhost:8080/readyz"
        );
    }

    #[tokio::test]
    async fn test_landing_under_path_prefix() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/heal/v1/me/landing")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"profile":{"name":"Meera"}}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&format!("{}/heal", server.url())).unwrap();
        let landing = client.landing("usr_103").await.unwrap();

        mock.assert_async().await;
        assert_eq!(landing.profile.unwrap().name.as_deref(), Some("Meera"));
    }

    #[tokio::test]
    async fn test_predict_period_posts_camel_case() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/predict-period")
            .match_body(mockito::Matcher::Json(serde_json::json!({
                "userId": "usr_100",
                "screeningId": "scr_001"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"success","predictedDate":"2026-03-05"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let response = client.predict_period("usr_100", "scr_001").await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, "success");
        assert_eq!(response.predicted_date.as_deref(), Some("2026-03-05"));
    }

    #[tokio::test]
    async fn test_predict_error_uses_envelope_message() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/predict-period")
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"status":"error","message":"Screening not found"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.predict_period("usr_100", "nope").await.unwrap_err();

        let message = err.to_string();
        assert!(message.contains("404"));
        assert!(message.contains("Screening not found"));
    }

    #[tokio::test]
    async fn test_landing_sends_user_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/me/landing")
            .match_query(mockito::Matcher::UrlEncoded(
                "userId".into(),
                "usr_101".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"profile":{"name":"Ananya"},"preferences":null,
                    "landing_page_summary":{"risk":{"level":"low","score":31}}}"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let landing = client.landing("usr_101").await.unwrap();

        mock.assert_async().await;
        assert_eq!(landing.profile.unwrap().name.as_deref(), Some("Ananya"));
        assert!(landing.preferences.is_none());
        let risk = landing.landing_page_summary.unwrap().risk.unwrap();
        assert_eq!(risk.score, Some(31));
    }

    #[tokio::test]
    async fn test_landing_not_found_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/me/landing")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .with_body("User not found: usr_404")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client.landing("usr_404").await.unwrap_err();
        assert!(err.to_string().contains("User not found: usr_404"));
    }

    #[tokio::test]
    async fn test_check_status_reads_unavailable_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/readyz")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ready":false,"reason":"Server still starting"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let (status, readiness): (u16, Readiness) = client.check_status("readyz").await.unwrap();

        assert_eq!(status, 503);
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Server still starting"));
    }
}
