//! OpenAI-compatible chat completions client.

use super::prompt::{system_instruction, user_message};
use super::{OptimizationService, OptimizeRequest, ServiceReply};
use crate::config::ProviderConfig;
use crate::error::{OptimoError, OptimoResult};
use async_trait::async_trait;
use tokio::sync::OnceCell;

/// Temperature used when the config does not set one.
const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Optimization service backed by a chat completions endpoint.
///
/// Works with the OpenAI API and the OpenAI-compatible endpoints of
/// Anthropic, Google and self-hosted models.
///
/// # Example
/// ```ignore
/// use optimo::{ChatCompletionService, OptimizationService, OptimizeRequest, OptionSet};
/// use optimo::config::{Provider, ProviderConfig};
///
/// let service = ChatCompletionService::new(ProviderConfig::new(Provider::OpenAI, "sk-..."))?;
/// let reply = service
///     .optimize(&OptimizeRequest::new("write a poem", OptionSet::default()))
///     .await?;
/// println!("{:?}", reply.optimized_prompt);
/// ```
#[derive(Debug, Clone)]
pub struct ChatCompletionService {
    api_key: String,
    api_url: String,
    model: String,
    temperature: f32,
    name: &'static str,
    client: reqwest::Client,
}

impl ChatCompletionService {
    /// Create a service from a validated provider config.
    pub fn new(config: ProviderConfig) -> OptimoResult<Self> {
        config.validate()?;
        let api_url = config
            .endpoint()
            .ok_or(OptimoError::NotConfigured("endpoint"))?
            .to_string();
        let model = config
            .model_name()
            .ok_or(OptimoError::NotConfigured("model"))?
            .to_string();

        Ok(Self {
            api_key: config.api_key.trim().to_string(),
            api_url,
            model,
            temperature: config.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            name: config.provider.as_str(),
            client: reqwest::Client::new(),
        })
    }

    /// Use a preconfigured HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Endpoint the requests go to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Model the requests ask for.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn body(&self, request: &OptimizeRequest) -> serde_json::Value {
        serde_json::json!({
            "model": &self.model,
            "messages": [
                { "role": "system", "content": system_instruction(&request.options) },
                { "role": "user", "content": user_message(&request.prompt_text) },
            ],
            "temperature": self.temperature,
        })
    }
}

/// Turn a chat completions response body into a reply.
pub(crate) fn reply_from_body(json: &serde_json::Value) -> ServiceReply {
    if let Some(message) = json
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return ServiceReply::failure(message);
    }

    let content = json
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(str::trim);

    match content {
        Some(content) if !content.is_empty() => ServiceReply::success(content),
        Some(_) => ServiceReply::failure("Provider returned an empty prompt"),
        None => ServiceReply::failure(
            OptimoError::MissingField("choices[0].message.content").to_string(),
        ),
    }
}

#[async_trait]
impl OptimizationService for ChatCompletionService {
    async fn optimize(&self, request: &OptimizeRequest) -> OptimoResult<ServiceReply> {
        log::debug!("{}: optimizing with {}", self.name, self.model);

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&self.body(request))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Ok(ServiceReply::failure("Authentication failed"));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Ok(ServiceReply::failure("Rate limit exceeded"));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            log::warn!("{}: HTTP {}: {}", self.name, status, error_text);
            return Ok(ServiceReply::failure(format!("HTTP {}", status)));
        }

        let json: serde_json::Value = match response.json().await {
            Ok(json) => json,
            Err(e) if e.is_decode() => {
                return Ok(ServiceReply::failure("Provider returned malformed JSON"))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(reply_from_body(&json))
    }

    fn provider_name(&self) -> &'static str {
        self.name
    }
}

/// Chat completions service built from its provider config on first use.
///
/// Requests the session rejects locally never reach it, so they need no
/// credentials. An invalid config is answered with a failed reply carrying
/// the validation message.
#[derive(Debug)]
pub struct DeferredChatService {
    config: ProviderConfig,
    inner: OnceCell<ChatCompletionService>,
}

impl DeferredChatService {
    /// Wrap a provider config without validating it.
    pub fn new(config: ProviderConfig) -> Self {
        Self {
            config,
            inner: OnceCell::new(),
        }
    }

    /// The wrapped config.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    async fn service(&self) -> OptimoResult<&ChatCompletionService> {
        self.inner
            .get_or_try_init(|| async { ChatCompletionService::new(self.config.clone()) })
            .await
    }
}

#[async_trait]
impl OptimizationService for DeferredChatService {
    async fn optimize(&self, request: &OptimizeRequest) -> OptimoResult<ServiceReply> {
        match self.service().await {
            Ok(service) => service.optimize(request).await,
            Err(e @ OptimoError::InvalidConfig(_)) | Err(e @ OptimoError::NotConfigured(_)) => {
                log::warn!("{}: {}", self.provider_name(), e);
                Ok(ServiceReply::failure(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    fn provider_name(&self) -> &'static str {
        self.config.provider.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;
    use crate::options::OptionSet;

    #[test]
    fn test_service_from_config() {
        let service = ChatCompletionService::new(
            ProviderConfig::new(Provider::Google, " key ").with_temperature(0.2),
        )
        .unwrap();
        assert_eq!(service.provider_name(), "google");
        assert_eq!(service.model(), "gemini-2.5-flash");
        assert!(service.api_url().contains("generativelanguage"));
        assert_eq!(service.api_key, "key");
        assert_eq!(service.temperature, 0.2);
    }

    #[test]
    fn test_service_rejects_invalid_config() {
        let err = ChatCompletionService::new(ProviderConfig::new(Provider::Custom, "key"))
            .unwrap_err();
        assert!(matches!(err, OptimoError::InvalidConfig(_)));
    }

    #[test]
    fn test_request_body() {
        let service =
            ChatCompletionService::new(ProviderConfig::new(Provider::OpenAI, "sk")).unwrap();
        let body = service.body(&OptimizeRequest::new(
            "draft",
            OptionSet::new().with_tone("Direct"),
        ));
        assert_eq!(body["model"], "gpt-4");
        assert_eq!(body["messages"][0]["role"], "system");
        assert!(body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("direct tone"));
        assert_eq!(body["messages"][1]["content"], "Prompt to optimize:\ndraft");
    }

    #[test]
    fn test_reply_from_body() {
        let ok = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "  Better prompt " } }]
        });
        assert_eq!(reply_from_body(&ok), ServiceReply::success("Better prompt"));

        let err = serde_json::json!({ "error": { "message": "quota exceeded" } });
        assert_eq!(reply_from_body(&err), ServiceReply::failure("quota exceeded"));

        let missing = serde_json::json!({ "choices": [] });
        let reply = reply_from_body(&missing);
        assert!(!reply.success);
        assert!(reply.error.unwrap().contains("choices[0].message.content"));
    }

    #[tokio::test]
    async fn test_deferred_service_reports_invalid_config_as_failure() {
        let service = DeferredChatService::new(ProviderConfig::new(Provider::OpenAI, "  "));
        assert_eq!(service.provider_name(), "openai");

        let reply = service
            .optimize(&OptimizeRequest::new("draft", OptionSet::default()))
            .await
            .unwrap();
        assert!(!reply.success);
        assert_eq!(
            reply.error.as_deref(),
            Some("Invalid configuration: Please enter an API key")
        );
    }
}
