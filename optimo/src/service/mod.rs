//! Optimization service abstraction.
//!
//! The prompt rewrite itself happens in an external provider. The core only
//! needs one call that takes the raw text plus options and answers with the
//! rewritten text or a failure message.

mod chat;
mod prompt;

pub use chat::{ChatCompletionService, DeferredChatService};
pub use prompt::{system_instruction, user_message};

use crate::error::OptimoResult;
use crate::options::OptionSet;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Payload of one optimization call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    /// Trimmed prompt text from the surface.
    pub prompt_text: String,
    /// Rewrite options.
    pub options: OptionSet,
}

impl OptimizeRequest {
    /// Create a request.
    pub fn new(prompt_text: impl Into<String>, options: OptionSet) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            options,
        }
    }
}

/// Answer of the service: `{success: true, optimizedPrompt}` or
/// `{success: false, error}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceReply {
    /// Whether the rewrite succeeded.
    pub success: bool,
    /// Rewritten prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimized_prompt: Option<String>,
    /// Failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceReply {
    /// A successful reply.
    pub fn success(optimized_prompt: impl Into<String>) -> Self {
        Self {
            success: true,
            optimized_prompt: Some(optimized_prompt.into()),
            error: None,
        }
    }

    /// A failed reply.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            optimized_prompt: None,
            error: Some(error.into()),
        }
    }
}

/// External prompt-rewriting service.
///
/// `Err` is reserved for transport failures. A provider that answered but
/// refused or failed returns `Ok` with `success: false`.
#[async_trait]
pub trait OptimizationService: Send + Sync {
    /// Rewrite one prompt.
    async fn optimize(&self, request: &OptimizeRequest) -> OptimoResult<ServiceReply>;

    /// Check that the provider is reachable and the credentials work.
    async fn test_connection(&self) -> OptimoResult<ServiceReply> {
        self.optimize(&OptimizeRequest::new(
            "Say hello in one short sentence.",
            OptionSet::default(),
        ))
        .await
    }

    /// Provider name for logging.
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_wire_shape() {
        let reply: ServiceReply =
            serde_json::from_str(r#"{"success":true,"optimizedPrompt":"X"}"#).unwrap();
        assert_eq!(reply, ServiceReply::success("X"));

        let reply: ServiceReply =
            serde_json::from_str(r#"{"success":false,"error":"quota"}"#).unwrap();
        assert_eq!(reply, ServiceReply::failure("quota"));

        let json = serde_json::to_string(&ServiceReply::success("Y")).unwrap();
        assert_eq!(json, r#"{"success":true,"optimizedPrompt":"Y"}"#);
    }

    #[test]
    fn test_request_wire_shape() {
        let request = OptimizeRequest::new("hi", OptionSet::default());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["promptText"], "hi");
        assert_eq!(json["options"]["persona"], "Expert");
    }
}
