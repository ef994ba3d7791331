use super::api::{
    Content, GenerateContentConfig, GenerateContentParameters, GenerateContentResponse,
    GenerateContentResponseUsageMetadata, Part as GooglePart,
};
use crate::{
    client_utils, LanguageModel, LanguageModelError, LanguageModelInput, LanguageModelResult,
    Message, ModelResponse, ModelUsage, Part, ResponseFormatOption,
};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Client,
};
use std::collections::HashMap;

const PROVIDER: &str = "google";

/// The Gemini model used when none is configured.
pub const DEFAULT_MODEL_ID: &str = "gemini-2.5-flash";

pub struct GoogleModel {
    model_id: String,
    api_key: String,
    base_url: String,
    client: Client,
    headers: HashMap<String, String>,
}

#[derive(Clone, Default)]
pub struct GoogleModelOptions {
    pub api_key: String,
    pub base_url: Option<String>,
    pub headers: Option<HashMap<String, String>>,
    pub client: Option<Client>,
}

impl GoogleModel {
    #[must_use]
    pub fn new(model_id: impl Into<String>, options: GoogleModelOptions) -> Self {
        let GoogleModelOptions {
            api_key,
            base_url,
            headers,
            client,
        } = options;

        let base_url = base_url
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com/v1beta".to_string())
            .trim_end_matches('/')
            .to_string();
        let client = client.unwrap_or_else(Client::new);
        let headers = headers.unwrap_or_default();

        Self {
            model_id: model_id.into(),
            api_key,
            base_url,
            client,
            headers,
        }
    }

    fn request_headers(&self) -> LanguageModelResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        for (key, value) in &self.headers {
            let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|error| {
                LanguageModelError::InvalidInput(format!(
                    "Invalid Google header name '{key}': {error}"
                ))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|error| {
                LanguageModelError::InvalidInput(format!(
                    "Invalid Google header value for '{key}': {error}"
                ))
            })?;
            headers.insert(header_name, header_value);
        }

        Ok(headers)
    }
}

#[async_trait::async_trait]
impl LanguageModel for GoogleModel {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn model_id(&self) -> String {
        self.model_id.clone()
    }

    async fn generate(&self, input: LanguageModelInput) -> LanguageModelResult<ModelResponse> {
        crate::opentelemetry::trace_generate(
            self.provider(),
            &self.model_id(),
            input,
            |input| async move {
                let params = convert_to_generate_content_parameters(input);

                let url = format!(
                    "{}/models/{}:generateContent?key={}",
                    self.base_url, self.model_id, self.api_key
                );

                let headers = self.request_headers()?;
                let response: GenerateContentResponse =
                    client_utils::send_json(&self.client, &url, &params, headers).await?;

                if let Some(reason) = response
                    .prompt_feedback
                    .as_ref()
                    .and_then(|feedback| feedback.block_reason.as_ref())
                {
                    let detail = response
                        .prompt_feedback
                        .as_ref()
                        .and_then(|feedback| feedback.block_reason_message.clone())
                        .unwrap_or_default();
                    return Err(LanguageModelError::Refusal(
                        format!("prompt blocked ({reason}) {detail}")
                            .trim_end()
                            .to_string(),
                    ));
                }

                let candidate = response
                    .candidates
                    .and_then(|c| c.into_iter().next())
                    .ok_or_else(|| {
                        LanguageModelError::Invariant(
                            PROVIDER,
                            "No candidate in response".to_string(),
                        )
                    })?;

                if let Some(reason) = candidate
                    .finish_reason
                    .as_deref()
                    .filter(|reason| *reason != "STOP")
                {
                    tracing::warn!(finish_reason = reason, "gemini stopped early");
                }

                let content =
                    map_google_content(candidate.content.and_then(|c| c.parts).unwrap_or_default());

                let usage = response
                    .usage_metadata
                    .as_ref()
                    .map(map_google_usage_metadata);

                Ok(ModelResponse { content, usage })
            },
        )
        .await
    }
}

fn convert_to_generate_content_parameters(input: LanguageModelInput) -> GenerateContentParameters {
    let contents = input
        .messages
        .into_iter()
        .map(convert_to_google_content)
        .collect();

    let mut params = GenerateContentParameters {
        contents,
        ..Default::default()
    };
    let mut config = GenerateContentConfig::default();

    if let Some(system_prompt) = input.system_prompt {
        params.system_instruction = Some(Content {
            role: Some("system".to_string()),
            parts: Some(vec![GooglePart {
                text: Some(system_prompt),
                ..Default::default()
            }]),
        });
    }

    if let Some(temp) = input.temperature {
        config.temperature = Some(temp);
    }
    if let Some(max_tokens) = input.max_tokens {
        config.max_output_tokens = Some(max_tokens);
    }

    if let Some(response_format) = input.response_format {
        let (response_mime_type, response_json_schema) =
            convert_to_google_response_schema(response_format);
        config.response_mime_type = Some(response_mime_type);
        config.response_json_schema = response_json_schema;
    }

    params.generation_config = Some(config);
    params
}

fn convert_to_google_content(message: Message) -> Content {
    let Message::User(user) = message;
    Content {
        role: Some("user".to_string()),
        parts: Some(
            user.content
                .into_iter()
                .map(|part| match part {
                    Part::Text(text) => GooglePart {
                        text: Some(text.text),
                        ..Default::default()
                    },
                })
                .collect(),
        ),
    }
}

fn convert_to_google_response_schema(
    response_format: ResponseFormatOption,
) -> (String, Option<serde_json::Value>) {
    let ResponseFormatOption::Json(json_format) = response_format;
    ("application/json".to_string(), json_format.schema)
}

/// Thought parts are dropped, only the answer text is kept.
fn map_google_content(parts: Vec<GooglePart>) -> Vec<Part> {
    parts
        .into_iter()
        .filter(|part| !part.thought.unwrap_or(false))
        .filter_map(|part| part.text.map(Part::text))
        .collect()
}

fn map_google_usage_metadata(usage: &GenerateContentResponseUsageMetadata) -> ModelUsage {
    ModelUsage {
        input_tokens: usage.prompt_token_count.unwrap_or(0),
        output_tokens: usage.candidates_token_count.unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ResponseFormatJson, UserMessage};
    use serde_json::json;

    #[test]
    fn converts_input_to_google_parameters() {
        let input = LanguageModelInput {
            system_prompt: Some("Be a game developer".to_string()),
            messages: vec![Message::User(UserMessage {
                content: vec![Part::text("User prompt: \"Pong\"")],
            })],
            response_format: Some(ResponseFormatOption::Json(ResponseFormatJson {
                name: "game".to_string(),
                description: None,
                schema: Some(json!({ "type": "object" })),
            })),
            max_tokens: Some(8192),
            temperature: Some(0.4),
        };

        let params = serde_json::to_value(convert_to_generate_content_parameters(input))
            .expect("parameters serialize");

        assert_eq!(
            params,
            json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "User prompt: \"Pong\"" }] }
                ],
                "systemInstruction": {
                    "role": "system",
                    "parts": [{ "text": "Be a game developer" }]
                },
                "generationConfig": {
                    "temperature": 0.4,
                    "maxOutputTokens": 8192,
                    "responseMimeType": "application/json",
                    "responseJsonSchema": { "type": "object" }
                }
            })
        );
    }

    #[test]
    fn drops_thought_parts() {
        let parts = vec![
            GooglePart {
                thought: Some(true),
                text: Some("thinking".to_string()),
            },
            GooglePart {
                thought: None,
                text: Some("{\"name\":\"Pong\"}".to_string()),
            },
        ];

        assert_eq!(
            map_google_content(parts),
            vec![Part::text("{\"name\":\"Pong\"}")]
        );
    }
}
