use thiserror::Error;

#[derive(Error, Debug)]
pub enum LanguageModelError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The request to the provider failed or the parsing of the response
    /// failed.
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The request returns a non-OK status code
    #[error("Status error: {1} (Status {0})")]
    StatusCode(reqwest::StatusCode, String),
    /// The response from the provider was unexpected. (e.g. no candidates
    /// returned by Gemini)
    #[error("Invariant from {0}: {1}")]
    Invariant(&'static str, String),
    /// The provider refused to process the input. (e.g. a blocked prompt)
    #[error("Refusal: {0}")]
    Refusal(String),
}

pub type LanguageModelResult<T> = Result<T, LanguageModelError>;

/// The model output did not satisfy the game output contract.
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("response is not a JSON object")]
    NotAnObject,
    #[error("field \"{field}\" is not a string")]
    WrongType { field: &'static str },
}

/// A failed generation. Every variant renders as a single message meant for
/// the user.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Failed to generate game from AI: {0}")]
    Provider(#[from] LanguageModelError),
    #[error("Failed to generate game from AI: the model returned no text")]
    EmptyResponse,
    #[error("Failed to generate game from AI: {0}")]
    Contract(#[from] ContractError),
    #[error("Failed to generate game from AI: the generation stopped unexpectedly")]
    Interrupted,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudioError {
    #[error("Sign in to generate games.")]
    Unauthorized,
    #[error("There is no game to edit yet.")]
    NoArtifact,
    #[error("Nothing to export while no game exists or a generation is running.")]
    ExportUnavailable,
}
