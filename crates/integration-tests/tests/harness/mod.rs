//! Shared fixtures: a mocked MaaS API and a mocked Langfuse ingestion endpoint

#![allow(dead_code)]

use std::sync::Arc;

use maas_client::MaasClient;
use maas_config::Config;
use maas_observability::Observability;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const API_KEY: &str = "sk-integration";
pub const MODEL: &str = "llama-3.1-8b-instruct";
pub const PUBLIC_KEY: &str = "pk-lf-test";
pub const SECRET_KEY: &str = "sk-lf-test";

/// Client wired to mock servers through a TOML config
pub struct TestEnv {
    pub maas: MockServer,
    pub langfuse: MockServer,
    pub observability: Arc<Observability>,
    pub client: MaasClient,
}

impl TestEnv {
    pub async fn start(tracing_enabled: bool) -> anyhow::Result<Self> {
        Self::start_with_ingestion_status(tracing_enabled, 207).await
    }

    /// Like [`TestEnv::start`], with the ingestion endpoint answering `status`
    pub async fn start_with_ingestion_status(tracing_enabled: bool, status: u16) -> anyhow::Result<Self> {
        let maas = MockServer::start().await;
        let langfuse = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/public/ingestion"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({"successes": [], "errors": []})))
            .mount(&langfuse)
            .await;

        let toml = format!(
            r#"
[client]
api_key = "{API_KEY}"
base_url = "{maas}/"
model = "{MODEL}"
timeout = "10s"

[tracing]
enabled = {tracing_enabled}
host = "{langfuse}"
public_key = "{PUBLIC_KEY}"
secret_key = "{SECRET_KEY}"
environment = "test"
release = "integration"
flush_at = 1000
"#,
            maas = maas.uri(),
            langfuse = langfuse.uri(),
        );

        let config = Config::from_toml_str(&toml)?;
        let observability = Arc::new(Observability::from_settings(&config.tracing));
        let client = MaasClient::from_config(&config.client.resolve()?, Arc::clone(&observability))?;

        Ok(Self {
            maas,
            langfuse,
            observability,
            client,
        })
    }

    /// Every event posted to the ingestion endpoint, in order
    pub async fn ingested(&self) -> Vec<Value> {
        let requests = self.langfuse.received_requests().await.unwrap_or_default();

        requests
            .iter()
            .filter_map(|r| r.body_json::<Value>().ok())
            .flat_map(|body| body["batch"].as_array().cloned().unwrap_or_default())
            .collect()
    }

    /// Ingested events of one type
    pub async fn ingested_of(&self, kind: &str) -> Vec<Value> {
        self.ingested()
            .await
            .into_iter()
            .filter(|event| event["type"] == kind)
            .collect()
    }

    pub async fn mock_json(&self, http_method: &str, endpoint: &str, status: u16, body: Value) {
        Mock::given(method(http_method))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_json(body))
            .mount(&self.maas)
            .await;
    }

    pub async fn mock_sse(&self, endpoint: &str, frames: &[Value]) {
        let mut body: String = frames.iter().map(|f| format!("data: {f}\n\n")).collect();
        body.push_str("data: [DONE]\n\n");

        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&self.maas)
            .await;
    }
}

pub fn chat_reply(content: &str) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1_718_000_000,
        "model": MODEL,
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}],
        "usage": {"prompt_tokens": 7, "completion_tokens": 2, "total_tokens": 9}
    })
}

pub fn chat_delta(content: &str) -> Value {
    json!({"choices": [{"index": 0, "delta": {"content": content}}]})
}
