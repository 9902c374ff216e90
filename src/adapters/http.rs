use crate::config::ServicesConfig;
use crate::core::state::Stage;
use crate::core::{DraftService, ExpansionService};
use crate::domain::model::{ModuleDraft, SuggestionSet};
use crate::utils::error::{PlannerError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct DraftRequest<'a> {
    input: &'a str,
    duration: u32,
}

#[derive(Deserialize)]
struct DraftResponse {
    modules: Vec<ModuleDraft>,
}

#[derive(Serialize)]
struct ExpansionRequest<'a> {
    data: &'a [ModuleDraft],
    duration: u32,
}

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder().timeout(timeout).build().map_err(|e| PlannerError::ConfigError {
        message: format!("failed to build HTTP client: {}", e),
    })
}

/// POSTs `body` to `endpoint` and returns the JSON response body.
async fn post_json<B: Serialize + ?Sized>(
    client: &Client,
    endpoint: &str,
    body: &B,
    stage: Stage,
) -> Result<serde_json::Value> {
    tracing::debug!("Calling {} service at {}", stage, endpoint);
    let response = client
        .post(endpoint)
        .json(body)
        .send()
        .await
        .map_err(|e| PlannerError::service(stage, format!("request failed: {}", e)))?;

    let status = response.status();
    tracing::debug!("{} service response status: {}", stage, status);
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(PlannerError::service(
            stage,
            format!("HTTP {}: {}", status, body.chars().take(200).collect::<String>()),
        ));
    }

    response
        .json()
        .await
        .map_err(|e| PlannerError::service(stage, format!("invalid JSON response: {}", e)))
}

pub struct HttpDraftService {
    client: Client,
    endpoint: String,
}

impl HttpDraftService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &ServicesConfig) -> Result<Self> {
        Self::new(config.draft_endpoint.clone(), config.timeout())
    }
}

#[async_trait]
impl DraftService for HttpDraftService {
    async fn refactor(&self, description: &str, duration: u32) -> Result<Vec<ModuleDraft>> {
        let request = DraftRequest {
            input: description,
            duration,
        };
        let value = post_json(&self.client, &self.endpoint, &request, Stage::Draft).await?;
        let response: DraftResponse = serde_json::from_value(value)
            .map_err(|e| PlannerError::service(Stage::Draft, format!("malformed drafts: {}", e)))?;
        Ok(response.modules)
    }
}

pub struct HttpExpansionService {
    client: Client,
    endpoint: String,
}

impl HttpExpansionService {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &ServicesConfig) -> Result<Self> {
        Self::new(config.expansion_endpoint.clone(), config.timeout())
    }
}

#[async_trait]
impl ExpansionService for HttpExpansionService {
    async fn expand(&self, drafts: &[ModuleDraft], duration: u32) -> Result<SuggestionSet> {
        let request = ExpansionRequest {
            data: drafts,
            duration,
        };
        let value = post_json(&self.client, &self.endpoint, &request, Stage::Expansion).await?;
        SuggestionSet::from_value(value).map_err(|message| PlannerError::service(Stage::Expansion, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Suggestion;
    use httpmock::prelude::*;
    use serde_json::json;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn drafts() -> Vec<ModuleDraft> {
        vec![
            ModuleDraft {
                title: "Auth".to_string(),
                module_name: "auth".to_string(),
                duration: 2,
            },
            ModuleDraft {
                title: "UI".to_string(),
                module_name: "ui".to_string(),
                duration: 3,
            },
        ]
    }

    #[tokio::test]
    async fn test_refactor_posts_description_and_duration() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/api/refactor-text")
                .json_body(json!({"input": "Build a todo app", "duration": 10}));
            then.status(200).json_body(json!({
                "modules": [
                    {"title": "Auth", "moduleName": "auth", "duration": 2},
                    {"title": "UI", "moduleName": "ui", "duration": 3}
                ]
            }));
        });

        let service = HttpDraftService::new(server.url("/api/refactor-text"), TIMEOUT).unwrap();
        let result = service.refactor("Build a todo app", 10).await.unwrap();

        api_mock.assert();
        assert_eq!(result, drafts());
    }

    #[tokio::test]
    async fn test_refactor_server_error_is_draft_service_error() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/api/refactor-text");
            then.status(500).body("model overloaded");
        });

        let service = HttpDraftService::new(server.url("/api/refactor-text"), TIMEOUT).unwrap();
        let err = service.refactor("Build a todo app", 10).await.unwrap_err();

        api_mock.assert();
        match err {
            PlannerError::ServiceError { stage, message } => {
                assert_eq!(stage, Stage::Draft);
                assert!(message.contains("500"));
                assert!(message.contains("model overloaded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_refactor_rejects_missing_modules_field() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/refactor-text");
            then.status(200).json_body(json!({"text": "here are some modules"}));
        });

        let service = HttpDraftService::new(server.url("/api/refactor-text"), TIMEOUT).unwrap();
        let err = service.refactor("x", 1).await.unwrap_err();
        assert!(matches!(err, PlannerError::ServiceError { stage: Stage::Draft, .. }));
    }

    #[tokio::test]
    async fn test_expand_posts_drafts_and_validates_result() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/api/generate").json_body(json!({
                "data": [
                    {"title": "Auth", "moduleName": "auth", "duration": 2},
                    {"title": "UI", "moduleName": "ui", "duration": 3}
                ],
                "duration": 10
            }));
            then.status(200).json_body(json!({
                "suggestions": [
                    {"title": "Auth", "moduleName": "auth", "duration": 2, "exists": false},
                    {"title": "UI", "moduleName": "ui", "duration": 3, "exists": true}
                ]
            }));
        });

        let service = HttpExpansionService::new(server.url("/api/generate"), TIMEOUT).unwrap();
        let set = service.expand(&drafts(), 10).await.unwrap();

        api_mock.assert();
        assert_eq!(
            set.suggestions,
            vec![
                Suggestion::new("Auth", "auth", 2, false),
                Suggestion::new("UI", "ui", 3, true),
            ]
        );
    }

    #[tokio::test]
    async fn test_expand_malformed_shape_is_expansion_service_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).json_body(json!({"suggestions": {"title": "Auth"}}));
        });

        let service = HttpExpansionService::new(server.url("/api/generate"), TIMEOUT).unwrap();
        let err = service.expand(&drafts(), 10).await.unwrap_err();
        match err {
            PlannerError::ServiceError { stage, message } => {
                assert_eq!(stage, Stage::Expansion);
                assert!(message.contains("must be a list"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_expand_blank_title_is_expansion_service_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/api/generate");
            then.status(200).json_body(json!({"suggestions": [
                {"title": "Auth", "moduleName": "auth", "duration": 2, "exists": false},
                {"title": "  ", "moduleName": "ui", "duration": 3, "exists": false}
            ]}));
        });

        let service = HttpExpansionService::new(server.url("/api/generate"), TIMEOUT).unwrap();
        let err = service.expand(&drafts(), 10).await.unwrap_err();
        assert!(matches!(
            err,
            PlannerError::ServiceError { stage: Stage::Expansion, ref message } if message.contains("blank title")
        ));
    }
}
