//! API client for communicating with the prediction service

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use style_lib::store::PredictionRecord;
use tracing::debug;
use url::Url;

/// API client for the prediction service
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

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    /// GET a health endpoint, where 503 still carries a meaningful body
    pub async fn get_health<T: DeserializeOwned>(&self, path: &str) -> Result<(StatusCode, T)> {
        let url = self.base_url.join(path).context("Invalid path")?;
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        if !status.is_success() && status != StatusCode::SERVICE_UNAVAILABLE {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        let body = response.json().await.context("Failed to parse response")?;
        Ok((status, body))
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("API error ({}): {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceBanner {
    pub message: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentPredictions {
    pub predictions: Vec<PredictionRecord>,
    pub count: usize,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoundPrediction {
    pub prediction: PredictionRecord,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use style_lib::{LearningStyle, PredictionResponse};

    fn record_json() -> serde_json::Value {
        json!({
            "_id": "65f1a2b3c4d5e6f708192a3b",
            "prediction_id": "7d0c1f5e-2a7b-4c1e-9b8e-0f6d2a1c3b4d",
            "learning_style": 2,
            "predicted_style": "Kinesthetic",
            "probabilities": [
                {"style": "Visual", "percentage": 10.0, "is_predicted": false},
                {"style": "Auditory", "percentage": 20.0, "is_predicted": false},
                {"style": "Kinesthetic", "percentage": 60.0, "is_predicted": true},
                {"style": "Reading/Writing", "percentage": 10.0, "is_predicted": false}
            ],
            "predicted_at": "2024-03-09T14:05:07Z",
            "user_data": {
                "StudyHours": 19, "Attendance": 64, "Resources": 1, "Extracurricular": 0,
                "Motivation": 0, "Internet": 1, "Gender": 0, "Age": 19, "OnlineCourses": 8,
                "Discussions": 1, "AssignmentCompletion": 59, "ExamScore": 40, "EduTech": 0,
                "StressLevel": 1, "FinalGrade": 3
            }
        })
    }

    #[tokio::test]
    async fn test_get_prediction() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/predictions/7d0c1f5e-2a7b-4c1e-9b8e-0f6d2a1c3b4d")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"prediction": record_json(), "status": "success"}).to_string())
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let found: FoundPrediction = client
            .get("predictions/7d0c1f5e-2a7b-4c1e-9b8e-0f6d2a1c3b4d")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(found.prediction.predicted_style, LearningStyle::Kinesthetic);
        assert_eq!(found.prediction.id.to_hex(), "65f1a2b3c4d5e6f708192a3b");
        assert_eq!(found.prediction.user_data.study_hours, 19);
    }

    #[tokio::test]
    async fn test_list_with_limit() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/predictions")
            .match_query(mockito::Matcher::UrlEncoded("limit".into(), "1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({"predictions": [record_json()], "count": 1, "status": "success"})
                    .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let recent: RecentPredictions = client.get("predictions?limit=1").await.unwrap();

        mock.assert_async().await;
        assert_eq!(recent.count, 1);
        assert_eq!(recent.predictions.len(), 1);
    }

    #[tokio::test]
    async fn test_post_prediction() {
        let mut server = mockito::Server::new_async().await;
        let record = record_json()["user_data"].clone();
        let mock = server
            .mock("POST", "/predict-style")
            .match_body(mockito::Matcher::Json(record.clone()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "predicted_style": "Kinesthetic",
                    "predictions": record_json()["probabilities"],
                    "status": "success",
                    "input_received": record,
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let response: PredictionResponse = client.post("predict-style", &record).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.predicted_style, LearningStyle::Kinesthetic);
        assert_eq!(response.predictions.len(), 4);
        assert_eq!(
            response.predictions.iter().filter(|s| s.is_predicted).count(),
            1
        );
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/predictions/missing")
            .with_status(404)
            .with_body(r#"{"detail":"Prediction not found"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let err = client
            .get::<FoundPrediction>("predictions/missing")
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("404"));
        assert!(message.contains("Prediction not found"));
    }

    #[tokio::test]
    async fn test_health_endpoint_accepts_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/readyz")
            .with_status(503)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ready":false,"reason":"Service not ready"}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/healthz")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url()).unwrap();
        let (status, readiness): (StatusCode, style_lib::ReadinessResponse) =
            client.get_health("readyz").await.unwrap();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(!readiness.ready);

        assert!(client
            .get_health::<style_lib::HealthResponse>("healthz")
            .await
            .is_err());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(ApiClient::new("not a url").is_err());
    }
}
