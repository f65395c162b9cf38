//! Chat relay to an OpenAI-compatible completion API
//!
//! Each call is a single blocking request with a fixed timeout. Failures are
//! reported to the caller as-is; nothing is retried.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

use crate::compiler::AgentEntry;
use crate::config::RuntimeConfig;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";
pub const MODEL_ENV: &str = "OPENAI_MODEL";

/// The only provider the relay speaks to
pub const OPENAI_PROVIDER: &str = "openai";

/// Errors from the relay, all reported to the client as HTTP 500
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("{0} is not set")]
    MissingApiKey(&'static str),

    #[error("Unsupported model_provider '{0}'")]
    UnsupportedProvider(String),

    #[error("OpenAI request failed: {status}: {message}")]
    Api { status: u16, message: String },

    #[error("OpenAI request failed: {0}")]
    Transport(String),

    #[error("OpenAI request timed out after {0:?}")]
    Timeout(Duration),

    #[error("{0}")]
    InvalidResponse(String),
}

/// One chat turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

/// Something that can answer a chat message on behalf of an agent
pub trait ChatBackend: Send + Sync {
    fn complete(&self, agent: &AgentEntry, history: &[ChatMessage], message: &str) -> Result<String, ChatError>;
}

/// Keep only user/assistant turns that carry text
pub fn sanitize_history(raw: &Value) -> Vec<ChatMessage> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            let role = item.get("role")?.as_str()?;
            let content = item.get("content")?.as_str()?;
            (matches!(role, "user" | "assistant") && !content.is_empty()).then(|| ChatMessage::new(role, content))
        })
        .collect()
}

/// Relay that talks to `<base_url>/chat/completions`
#[derive(Debug, Clone)]
pub struct OpenAiRelay {
    base_url: String,
    default_model: String,
    default_temperature: f64,
    timeout: Duration,
}

impl OpenAiRelay {
    /// Build from config, letting OPENAI_BASE_URL and OPENAI_MODEL override it
    pub fn from_config(config: &RuntimeConfig) -> Self {
        let base_url = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| config.base_url.clone());
        let default_model = std::env::var(MODEL_ENV).unwrap_or_else(|_| config.default_model.clone());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model,
            default_temperature: config.default_temperature,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    /// Request body for one completion
    pub fn build_payload(&self, agent: &AgentEntry, history: &[ChatMessage], message: &str) -> Value {
        let mut messages = vec![ChatMessage::new("system", agent.system_prompt.clone())];
        messages.extend(history.iter().cloned());
        messages.push(ChatMessage::new("user", message));

        let model = agent.model.clone().unwrap_or_else(|| self.default_model.clone());
        let temperature = agent
            .temperature
            .clone()
            .unwrap_or_else(|| json!(self.default_temperature));

        json!({
            "model": model,
            "messages": messages,
            "temperature": temperature,
        })
    }

    fn http_agent(&self) -> ureq::Agent {
        ureq::Agent::config_builder()
            .timeout_global(Some(self.timeout))
            .http_status_as_error(false)
            .build()
            .into()
    }
}

impl ChatBackend for OpenAiRelay {
    fn complete(&self, agent: &AgentEntry, history: &[ChatMessage], message: &str) -> Result<String, ChatError> {
        let provider = agent.provider().unwrap_or_else(|| OPENAI_PROVIDER.to_string());
        if provider != OPENAI_PROVIDER {
            return Err(ChatError::UnsupportedProvider(provider));
        }

        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(ChatError::MissingApiKey(API_KEY_ENV))?;

        let payload = self.build_payload(agent, history, message);
        let request_body = serde_json::to_string(&payload).map_err(|e| ChatError::InvalidResponse(e.to_string()))?;

        log::info!("Relaying chat to {} ({} history turns)", self.endpoint(), history.len());

        let mut response = self
            .http_agent()
            .post(&self.endpoint())
            .header("Authorization", &format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .send(request_body.as_bytes())
            .map_err(|e| match e {
                ureq::Error::Timeout(_) => ChatError::Timeout(self.timeout),
                other => ChatError::Transport(other.to_string()),
            })?;

        let status = response.status().as_u16();
        let response_body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(ChatError::Api {
                status,
                message: response_body,
            });
        }

        let data: Value = serde_json::from_str(&response_body)
            .map_err(|e| ChatError::InvalidResponse(format!("OpenAI response was not JSON: {}", e)))?;
        extract_reply(&data)
    }
}

/// Pull the first choice's message text out of a completion response
pub fn extract_reply(data: &Value) -> Result<String, ChatError> {
    let choice = data
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| ChatError::InvalidResponse("OpenAI response missing choices".to_string()))?;

    let content = choice
        .get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ChatError::InvalidResponse("OpenAI response missing content".to_string()))?;

    Ok(content.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relay() -> OpenAiRelay {
        OpenAiRelay {
            base_url: "http://localhost:9/v1".to_string(),
            default_model: "gpt-4o-mini".to_string(),
            default_temperature: 0.2,
            timeout: Duration::from_secs(1),
        }
    }

    fn agent(provider: Option<Value>) -> AgentEntry {
        AgentEntry {
            model_provider: provider,
            temperature: None,
            model: None,
            system_prompt: "You are helpful.".to_string(),
            dependencies: vec![],
        }
    }

    #[test]
    fn test_sanitize_history() {
        let raw = json!([
            {"role": "user", "content": "hi"},
            {"role": "system", "content": "ignore me"},
            {"role": "assistant", "content": ""},
            {"role": "assistant", "content": "hello"},
            {"content": "no role"},
            "garbage"
        ]);
        let history = sanitize_history(&raw);
        assert_eq!(
            history,
            vec![ChatMessage::new("user", "hi"), ChatMessage::new("assistant", "hello")]
        );
        assert!(sanitize_history(&json!({"not": "a list"})).is_empty());
        assert!(sanitize_history(&Value::Null).is_empty());
    }

    #[test]
    fn test_build_payload_defaults() {
        let payload = relay().build_payload(&agent(None), &[ChatMessage::new("user", "earlier")], "now");
        assert_eq!(payload["model"], "gpt-4o-mini");
        assert_eq!(payload["temperature"], json!(0.2));
        let messages = payload["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], "You are helpful.");
        assert_eq!(messages[2], json!({"role": "user", "content": "now"}));
    }

    #[test]
    fn test_build_payload_agent_overrides() {
        let mut a = agent(Some(json!("openai")));
        a.model = Some("gpt-4o".to_string());
        a.temperature = Some(json!(0.9));
        let payload = relay().build_payload(&a, &[], "q");
        assert_eq!(payload["model"], "gpt-4o");
        assert_eq!(payload["temperature"], json!(0.9));
    }

    #[test]
    fn test_unsupported_provider() {
        let err = relay()
            .complete(&agent(Some(json!("anthropic"))), &[], "hi")
            .unwrap_err();
        assert!(matches!(err, ChatError::UnsupportedProvider(ref p) if p == "anthropic"));
    }

    #[test]
    fn test_extract_reply() {
        let data = json!({"choices": [{"message": {"role": "assistant", "content": "  answer \n"}}]});
        assert_eq!(extract_reply(&data).unwrap(), "answer");

        let err = extract_reply(&json!({"choices": []})).unwrap_err();
        assert_eq!(err.to_string(), "OpenAI response missing choices");

        let err = extract_reply(&json!({"choices": [{"message": {}}]})).unwrap_err();
        assert_eq!(err.to_string(), "OpenAI response missing content");
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(relay().endpoint(), "http://localhost:9/v1/chat/completions");
    }
}
