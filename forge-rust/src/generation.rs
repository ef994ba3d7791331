use crate::{
    contract::{self, GeneratedGame},
    GameArtifact, GenerationError, LanguageModel, LanguageModelInput, Message,
};
use std::sync::Arc;

/// The result of one generation, as seen by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success {
        artifact: GameArtifact,
        explanation: String,
    },
    Failure {
        message: String,
    },
}

impl From<Result<GeneratedGame, GenerationError>> for GenerationOutcome {
    fn from(result: Result<GeneratedGame, GenerationError>) -> Self {
        match result {
            Ok(GeneratedGame {
                artifact,
                explanation,
            }) => Self::Success {
                artifact,
                explanation,
            },
            Err(error) => Self::Failure {
                message: error.to_string(),
            },
        }
    }
}

/// Turns a game idea into a [`GameArtifact`] with one model call.
///
/// There are no retries and no caching: every call to [`generate`] is
/// exactly one request to the model.
///
/// [`generate`]: GameGenerator::generate
pub struct GameGenerator {
    model: Arc<dyn LanguageModel + Send + Sync>,
    temperature: Option<f64>,
    max_output_tokens: Option<u32>,
}

impl GameGenerator {
    #[must_use]
    pub fn new(model: Arc<dyn LanguageModel + Send + Sync>) -> Self {
        Self {
            model,
            temperature: None,
            max_output_tokens: None,
        }
    }

    /// Set the temperature for sampling
    #[must_use]
    pub fn temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap the number of tokens the model may produce
    #[must_use]
    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_output_tokens);
        self
    }

    #[must_use]
    pub fn model_id(&self) -> String {
        self.model.model_id()
    }

    /// The request for `prompt`. The prompt is passed through untouched.
    #[must_use]
    pub fn build_input(&self, prompt: &str) -> LanguageModelInput {
        LanguageModelInput {
            system_prompt: Some(contract::SYSTEM_INSTRUCTION.to_string()),
            messages: vec![Message::user(format!("User prompt: \"{prompt}\""))],
            response_format: Some(contract::response_format()),
            max_tokens: self.max_output_tokens,
            temperature: self.temperature,
        }
    }

    pub async fn try_generate(&self, prompt: &str) -> Result<GeneratedGame, GenerationError> {
        let response = self.model.generate(self.build_input(prompt)).await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(contract::decode(&text)?)
    }

    pub async fn generate(&self, prompt: &str) -> GenerationOutcome {
        let result = self.try_generate(prompt).await;
        match &result {
            Ok(game) => tracing::info!(
                provider = self.model.provider(),
                model = %self.model.model_id(),
                game = %game.artifact.name,
                "game generated"
            ),
            Err(error) => tracing::error!(
                provider = self.model.provider(),
                model = %self.model.model_id(),
                %error,
                "error generating game code"
            ),
        }
        result.into()
    }
}
