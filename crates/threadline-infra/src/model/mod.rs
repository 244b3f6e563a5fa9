//! OpenAI-compatible chat-model provider.
//!
//! One [`OpenAiCompatibleModel`] serves any provider speaking the
//! OpenAI chat completions protocol; the deployment default is Groq.
//! Uses [`async_openai`] for type-safe request/response handling.

pub mod config;

use async_openai::config::OpenAIConfig;
use async_openai::types::chat::{
    ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
    ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
    ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
};
use async_openai::Client;
use secrecy::ExposeSecret;

use threadline_core::model::ChatModel;
use threadline_types::model::{ChatRequest, ChatResponse, ModelError, Usage};
use threadline_types::thread::MessageRole;

use self::config::ProviderConfig;

/// Chat-model provider for any OpenAI-compatible API.
///
/// # API Key Security
///
/// Does NOT derive Debug, to prevent accidental exposure of the API key
/// stored inside the `async_openai::Client`.
pub struct OpenAiCompatibleModel {
    client: Client<OpenAIConfig>,
    provider_name: String,
    default_model: String,
}

impl OpenAiCompatibleModel {
    /// Create a provider from a configuration.
    pub fn new(config: ProviderConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(config.api_key.expose_secret())
            .with_api_base(&config.base_url);

        Self {
            client: Client::with_config(openai_config),
            provider_name: config.provider_name,
            default_model: config.model,
        }
    }

    /// Create a Groq provider with its default base URL.
    pub fn groq(api_key: secrecy::SecretString, model: &str) -> Self {
        Self::new(config::groq_defaults(api_key, model))
    }

    /// Build a [`CreateChatCompletionRequest`] from a generic [`ChatRequest`].
    fn build_request(&self, request: &ChatRequest) -> CreateChatCompletionRequest {
        let mut messages: Vec<ChatCompletionRequestMessage> =
            Vec::with_capacity(request.messages.len());

        for msg in &request.messages {
            let oai_msg = match msg.role {
                MessageRole::System => {
                    ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                        content: ChatCompletionRequestSystemMessageContent::Text(
                            msg.content.clone(),
                        ),
                        name: None,
                    })
                }
                MessageRole::User => {
                    ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                        content: ChatCompletionRequestUserMessageContent::Text(
                            msg.content.clone(),
                        ),
                        name: None,
                    })
                }
                MessageRole::Assistant => {
                    #[allow(deprecated)]
                    ChatCompletionRequestMessage::Assistant(
                        ChatCompletionRequestAssistantMessage {
                            content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                                msg.content.clone(),
                            )),
                            refusal: None,
                            name: None,
                            audio: None,
                            tool_calls: None,
                            function_call: None,
                        },
                    )
                }
            };
            messages.push(oai_msg);
        }

        let model = if request.model.is_empty() {
            self.default_model.clone()
        } else {
            request.model.clone()
        };

        CreateChatCompletionRequest {
            model,
            messages,
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature.map(|t| t as f32),
            ..Default::default()
        }
    }
}

impl ChatModel for OpenAiCompatibleModel {
    fn name(&self) -> &str {
        &self.provider_name
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ModelError> {
        let oai_request = self.build_request(request);

        let response = self
            .client
            .chat()
            .create(oai_request)
            .await
            .map_err(map_openai_error)?;

        let content = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or_else(|| {
                ModelError::Deserialization("response contained no message content".to_string())
            })?;

        let usage = response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(ChatResponse {
            content,
            model: response.model,
            usage,
        })
    }
}

/// Map an `async_openai::error::OpenAIError` to a [`ModelError`].
fn map_openai_error(err: async_openai::error::OpenAIError) -> ModelError {
    use async_openai::error::OpenAIError;

    match &err {
        OpenAIError::ApiError(api_err) => {
            let code = api_err.code.as_deref().unwrap_or("");
            let error_type = api_err.r#type.as_deref().unwrap_or("");

            if code == "authentication_error"
                || error_type == "authentication_error"
                || api_err.message.contains("Incorrect API key")
                || api_err.message.contains("Invalid API Key")
            {
                ModelError::AuthenticationFailed
            } else if code == "rate_limit_exceeded" || error_type == "rate_limit_error" {
                ModelError::RateLimited {
                    retry_after_ms: None,
                }
            } else {
                ModelError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::Reqwest(reqwest_err) => {
            if let Some(status) = reqwest_err.status() {
                match status.as_u16() {
                    401 => ModelError::AuthenticationFailed,
                    429 => ModelError::RateLimited {
                        retry_after_ms: None,
                    },
                    _ => ModelError::Provider {
                        message: err.to_string(),
                    },
                }
            } else {
                ModelError::Provider {
                    message: err.to_string(),
                }
            }
        }
        OpenAIError::JSONDeserialize(_, content) => {
            ModelError::Deserialization(format!("failed to parse response: {content}"))
        }
        OpenAIError::InvalidArgument(msg) => ModelError::InvalidRequest(msg.clone()),
        _ => ModelError::Provider {
            message: err.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadline_types::thread::Message;

    fn provider() -> OpenAiCompatibleModel {
        OpenAiCompatibleModel::groq("gsk-test".into(), "llama-3.1-8b-instant")
    }

    #[test]
    fn test_groq_factory() {
        let model = provider();
        assert_eq!(model.name(), "groq");
        assert_eq!(model.default_model, "llama-3.1-8b-instant");
    }

    #[test]
    fn test_build_request_preserves_order_and_roles() {
        let model = provider();
        let request = ChatRequest {
            model: "llama-3.1-8b-instant".to_string(),
            messages: vec![
                Message::new(MessageRole::System, "be brief", 0),
                Message::new(MessageRole::User, "hi", 1),
                Message::new(MessageRole::Assistant, "hello", 2),
                Message::new(MessageRole::User, "and now?", 3),
            ],
            max_tokens: 512,
            temperature: Some(0.3),
        };

        let oai = model.build_request(&request);
        assert_eq!(oai.messages.len(), 4);
        assert!(matches!(
            oai.messages[0],
            ChatCompletionRequestMessage::System(_)
        ));
        assert!(matches!(
            oai.messages[1],
            ChatCompletionRequestMessage::User(_)
        ));
        assert!(matches!(
            oai.messages[2],
            ChatCompletionRequestMessage::Assistant(_)
        ));
        assert!(matches!(
            oai.messages[3],
            ChatCompletionRequestMessage::User(_)
        ));
        assert_eq!(oai.max_completion_tokens, Some(512));
        assert_eq!(oai.temperature, Some(0.3_f32));
    }

    #[test]
    fn test_build_request_falls_back_to_default_model() {
        let model = provider();
        let request = ChatRequest {
            model: String::new(),
            messages: vec![Message::new(MessageRole::User, "hi", 0)],
            max_tokens: 128,
            temperature: None,
        };
        let oai = model.build_request(&request);
        assert_eq!(oai.model, "llama-3.1-8b-instant");
    }
}
