mod artifact;
mod auth;
mod client_utils;
pub mod contract;
mod errors;
pub mod export;
pub mod gameforge_test;
mod generation;
pub mod google;
mod language_model;
mod opentelemetry;
pub mod preview;
mod session;
mod studio;
mod types;

pub use artifact::{ArtifactField, GameArtifact};
pub use auth::{AllowAll, AuthGate, Caller, DenyAll};
pub use errors::*;
pub use generation::{GameGenerator, GenerationOutcome};
pub use language_model::LanguageModel;
pub use session::{
    GenerationStatus, GenerationTicket, IgnoreReason, SessionSnapshot, StudioSession,
    WorkspaceView, DEFAULT_PROMPT,
};
pub use studio::{GenerateTrigger, Studio};
pub use types::*;
