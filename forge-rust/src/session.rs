use crate::{ArtifactField, GameArtifact, GenerationOutcome, StudioError};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};

/// The prompt a fresh session starts with.
pub const DEFAULT_PROMPT: &str =
    "A classic Snake game where the player controls a snake to eat food and grow longer.";

/// Where a generation stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Idle,
    Generating,
    Succeeded,
    Failed,
}

/// The views of the editable workspace.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceView {
    #[default]
    Preview,
    Code,
    Scene,
}

impl WorkspaceView {
    pub const ALL: [Self; 3] = [Self::Preview, Self::Code, Self::Scene];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Code => "code",
            Self::Scene => "scene",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Preview => "Preview",
            Self::Code => "Code",
            Self::Scene => "Scene",
        }
    }
}

impl fmt::Display for WorkspaceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkspaceView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preview" => Ok(Self::Preview),
            "code" => Ok(Self::Code),
            "scene" => Ok(Self::Scene),
            other => Err(format!("unknown workspace view: {other}")),
        }
    }
}

/// Why a generate trigger did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    EmptyPrompt,
    AlreadyGenerating,
}

/// Proof that a generation was started. Only the ticket of the generation in
/// flight can complete it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    id: u64,
    prompt: String,
}

impl GenerationTicket {
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }
}

#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Generating {
        ticket_id: u64,
    },
    Succeeded {
        artifact: Arc<GameArtifact>,
        explanation: String,
    },
    Failed {
        message: String,
        banner_visible: bool,
    },
}

/// All state of one studio page: the prompt, the generation phase with its
/// artifact or error, and the active workspace view.
///
/// This is a plain state machine with no I/O. [`crate::Studio`] drives it
/// around the model call.
#[derive(Debug, Clone)]
pub struct StudioSession {
    prompt: String,
    phase: Phase,
    view: WorkspaceView,
    revision: u64,
    next_ticket_id: u64,
}

impl Default for StudioSession {
    fn default() -> Self {
        Self::new(DEFAULT_PROMPT)
    }
}

impl StudioSession {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            phase: Phase::Idle,
            view: WorkspaceView::Preview,
            revision: 0,
            next_ticket_id: 1,
        }
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    #[must_use]
    pub fn status(&self) -> GenerationStatus {
        match self.phase {
            Phase::Idle => GenerationStatus::Idle,
            Phase::Generating { .. } => GenerationStatus::Generating,
            Phase::Succeeded { .. } => GenerationStatus::Succeeded,
            Phase::Failed { .. } => GenerationStatus::Failed,
        }
    }

    #[must_use]
    pub fn is_generating(&self) -> bool {
        matches!(self.phase, Phase::Generating { .. })
    }

    #[must_use]
    pub fn artifact(&self) -> Option<&Arc<GameArtifact>> {
        match &self.phase {
            Phase::Succeeded { artifact, .. } => Some(artifact),
            _ => None,
        }
    }

    /// Text for the assistant panel. A failure message doubles as the
    /// explanation.
    #[must_use]
    pub fn explanation(&self) -> &str {
        match &self.phase {
            Phase::Succeeded { explanation, .. } => explanation,
            Phase::Failed { message, .. } => message,
            Phase::Idle | Phase::Generating { .. } => "",
        }
    }

    /// The error banner, if it is showing.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed {
                message,
                banner_visible: true,
            } => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub fn view(&self) -> WorkspaceView {
        self.view
    }

    /// Bumped whenever the stored artifact is replaced or cleared.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn can_export(&self) -> bool {
        self.artifact().is_some()
    }

    /// Enter `Generating` for the current prompt.
    ///
    /// Clears the artifact, explanation and error, and switches back to the
    /// Preview view. Ignored when the prompt is empty or a generation is
    /// already in flight, in which case nothing changes.
    pub fn begin_generation(&mut self) -> Result<GenerationTicket, IgnoreReason> {
        if self.is_generating() {
            return Err(IgnoreReason::AlreadyGenerating);
        }
        if self.prompt.is_empty() {
            return Err(IgnoreReason::EmptyPrompt);
        }

        let id = self.next_ticket_id;
        self.next_ticket_id += 1;
        self.revision += 1;
        self.phase = Phase::Generating { ticket_id: id };
        self.view = WorkspaceView::Preview;

        Ok(GenerationTicket {
            id,
            prompt: self.prompt.clone(),
        })
    }

    /// Leave `Generating` with the outcome of the model call. Returns `false`
    /// and changes nothing if `ticket` is not the generation in flight.
    pub fn complete_generation(
        &mut self,
        ticket: &GenerationTicket,
        outcome: GenerationOutcome,
    ) -> bool {
        match self.phase {
            Phase::Generating { ticket_id } if ticket_id == ticket.id => {}
            _ => return false,
        }

        self.phase = match outcome {
            GenerationOutcome::Success {
                artifact,
                explanation,
            } => {
                self.revision += 1;
                Phase::Succeeded {
                    artifact: Arc::new(artifact),
                    explanation,
                }
            }
            GenerationOutcome::Failure { message } => Phase::Failed {
                message,
                banner_visible: true,
            },
        };
        true
    }

    /// Replace one code field of the artifact. The status does not change.
    pub fn edit_artifact(
        &mut self,
        field: ArtifactField,
        value: impl Into<String>,
    ) -> Result<(), StudioError> {
        let Phase::Succeeded { artifact, .. } = &mut self.phase else {
            return Err(StudioError::NoArtifact);
        };
        *artifact = Arc::new(artifact.with_field(field, value));
        self.revision += 1;
        Ok(())
    }

    /// Switching views never touches the artifact.
    pub fn switch_view(&mut self, view: WorkspaceView) {
        self.view = view;
    }

    /// Hide the error banner. The failure stays in the explanation.
    pub fn dismiss_error(&mut self) {
        if let Phase::Failed { banner_visible, .. } = &mut self.phase {
            *banner_visible = false;
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            status: self.status(),
            prompt: self.prompt.clone(),
            artifact: self.artifact().map(|artifact| artifact.as_ref().clone()),
            explanation: self.explanation().to_string(),
            error: self.error().map(str::to_string),
            view: self.view,
            revision: self.revision,
            can_export: self.can_export(),
        }
    }
}

/// A serializable copy of a [`StudioSession`] for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub status: GenerationStatus,
    pub prompt: String,
    pub artifact: Option<GameArtifact>,
    pub explanation: String,
    pub error: Option<String>,
    pub view: WorkspaceView,
    pub revision: u64,
    pub can_export: bool,
}
