use crate::{
    export::{self, ExportFile},
    preview::{PreviewFrame, PreviewRenderer, SandboxPolicy},
    ArtifactField, AuthGate, Caller, GameGenerator, GenerationError, GenerationOutcome,
    GenerationStatus, GenerationTicket, IgnoreReason, SessionSnapshot, StudioError,
    StudioSession, WorkspaceView,
};
use futures::{lock::Mutex, FutureExt};
use std::{panic::AssertUnwindSafe, sync::Arc};
use tracing::Instrument;

/// What a generate trigger led to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateTrigger {
    /// The model was called and the session settled in this status.
    Completed(GenerationStatus),
    /// Nothing happened.
    Ignored(IgnoreReason),
}

struct StudioState {
    session: StudioSession,
    renderer: PreviewRenderer,
}

/// Drives a [`StudioSession`]: gates generation behind authentication, calls
/// the model, and hands out previews and exports.
///
/// The session lock is never held while the model is working, so the UI can
/// keep reading state and editing the prompt during a generation.
///
/// A started generation runs on its own task. It settles the session even
/// when the caller of [`Studio::generate`] stops waiting for it.
pub struct Studio {
    generator: Arc<GameGenerator>,
    gate: Arc<dyn AuthGate>,
    state: Arc<Mutex<StudioState>>,
}

impl Studio {
    pub fn new(generator: impl Into<Arc<GameGenerator>>, gate: Arc<dyn AuthGate>) -> Self {
        Self::with_session(generator, gate, StudioSession::default())
    }

    pub fn with_session(
        generator: impl Into<Arc<GameGenerator>>,
        gate: Arc<dyn AuthGate>,
        session: StudioSession,
    ) -> Self {
        Self {
            generator: generator.into(),
            gate,
            state: Arc::new(Mutex::new(StudioState {
                session,
                renderer: PreviewRenderer::default(),
            })),
        }
    }

    /// Generate a game from the current prompt.
    ///
    /// Unauthenticated callers are rejected before any state changes. A
    /// trigger with an empty prompt or during a running generation is a
    /// no-op. Otherwise this returns once the model call has settled.
    ///
    /// Must be called within a Tokio runtime. Dropping the returned future
    /// does not cancel the model call.
    pub async fn generate(&self, caller: &Caller) -> Result<GenerateTrigger, StudioError> {
        if !self.gate.is_authenticated(caller).await {
            tracing::warn!("generation rejected for unauthenticated caller");
            return Err(StudioError::Unauthorized);
        }

        let ticket = {
            let mut state = self.state.lock().await;
            match state.session.begin_generation() {
                Ok(ticket) => ticket,
                Err(reason) => {
                    tracing::debug!(?reason, "generate trigger ignored");
                    return Ok(GenerateTrigger::Ignored(reason));
                }
            }
        };

        tracing::info!(prompt = ticket.prompt(), "generating game");
        let generation = tokio::spawn(
            settle_generation(self.generator.clone(), self.state.clone(), ticket)
                .in_current_span(),
        );

        let status = match generation.await {
            Ok(status) => status,
            Err(error) => {
                tracing::error!(%error, "generation task did not finish");
                self.state.lock().await.session.status()
            }
        };
        Ok(GenerateTrigger::Completed(status))
    }

    pub async fn set_prompt(&self, prompt: impl Into<String>) {
        self.state.lock().await.session.set_prompt(prompt);
    }

    pub async fn switch_view(&self, view: WorkspaceView) {
        self.state.lock().await.session.switch_view(view);
    }

    pub async fn edit_artifact(
        &self,
        field: ArtifactField,
        value: impl Into<String>,
    ) -> Result<(), StudioError> {
        self.state.lock().await.session.edit_artifact(field, value)
    }

    pub async fn dismiss_error(&self) {
        self.state.lock().await.session.dismiss_error();
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().await.session.snapshot()
    }

    /// The sandbox every preview runs in.
    pub async fn sandbox_policy(&self) -> SandboxPolicy {
        self.state.lock().await.renderer.policy().clone()
    }

    /// The preview for the current artifact. The document is only composed
    /// again after the artifact changed.
    pub async fn preview(&self) -> PreviewFrame {
        let mut state = self.state.lock().await;
        let StudioState { session, renderer } = &mut *state;
        let artifact = session.artifact().map(|artifact| artifact.as_ref());
        renderer.render(session.revision(), artifact)
    }

    /// The current artifact as a standalone HTML file.
    pub async fn export(&self) -> Result<ExportFile, StudioError> {
        let state = self.state.lock().await;
        if state.session.is_generating() {
            return Err(StudioError::ExportUnavailable);
        }
        let artifact = state
            .session
            .artifact()
            .ok_or(StudioError::ExportUnavailable)?;
        let file = export::assemble(artifact);
        tracing::info!(filename = %file.filename, "game exported");
        Ok(file)
    }
}

/// Calls the model for `ticket` and records the outcome. A panic in the
/// generator becomes a failed generation.
async fn settle_generation(
    generator: Arc<GameGenerator>,
    state: Arc<Mutex<StudioState>>,
    ticket: GenerationTicket,
) -> GenerationStatus {
    let outcome = AssertUnwindSafe(generator.generate(ticket.prompt()))
        .catch_unwind()
        .await
        .unwrap_or_else(|_| {
            tracing::error!("game generator panicked");
            GenerationOutcome::Failure {
                message: GenerationError::Interrupted.to_string(),
            }
        });

    let mut state = state.lock().await;
    if !state.session.complete_generation(&ticket, outcome) {
        tracing::warn!("stale generation result discarded");
    }
    state.session.status()
}
