//! Sandboxed execution of generated games.
//!
//! Generated script is untrusted. It only ever runs inside a browsing context
//! whose capabilities are an explicit allow-list; everything not on the list
//! is denied.

use crate::{export, GameArtifact};
use std::{fmt, sync::Arc};

/// A capability that can be granted to the preview context. Anything that is
/// not granted stays denied, including same-origin access, top-level
/// navigation, form submission, popups and modal dialogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SandboxCapability {
    Scripts,
    PointerLock,
}

impl SandboxCapability {
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::Scripts => "allow-scripts",
            Self::PointerLock => "allow-pointer-lock",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxPolicy {
    allowed: Vec<SandboxCapability>,
}

impl Default for SandboxPolicy {
    /// Script execution and pointer capture, nothing else.
    fn default() -> Self {
        Self::allowing([SandboxCapability::Scripts, SandboxCapability::PointerLock])
    }
}

impl SandboxPolicy {
    /// A policy that denies everything.
    #[must_use]
    pub fn deny_all() -> Self {
        Self {
            allowed: Vec::new(),
        }
    }

    pub fn allowing(capabilities: impl IntoIterator<Item = SandboxCapability>) -> Self {
        let mut allowed: Vec<SandboxCapability> = Vec::new();
        for capability in capabilities {
            if !allowed.contains(&capability) {
                allowed.push(capability);
            }
        }
        Self { allowed }
    }

    #[must_use]
    pub fn allows(&self, capability: SandboxCapability) -> bool {
        self.allowed.contains(&capability)
    }

    /// Value of the iframe `sandbox` attribute.
    #[must_use]
    pub fn iframe_attribute(&self) -> String {
        self.allowed
            .iter()
            .map(|capability| capability.token())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Value of a `Content-Security-Policy` header that applies the same
    /// sandbox to a document served on its own.
    #[must_use]
    pub fn content_security_policy(&self) -> String {
        if self.allowed.is_empty() {
            "sandbox".to_string()
        } else {
            format!("sandbox {}", self.iframe_attribute())
        }
    }
}

impl fmt::Display for SandboxPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.iframe_attribute())
    }
}

/// What the preview area shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewFrame {
    /// No game yet. Nothing is executed.
    Placeholder,
    /// The composed game document and the sandbox it must run in.
    Sandboxed {
        document: Arc<str>,
        policy: SandboxPolicy,
    },
}

/// Composes preview documents, once per artifact revision.
///
/// Re-rendering the same revision hands back the same document, so the game
/// only restarts when the artifact actually changed.
#[derive(Debug, Default)]
pub struct PreviewRenderer {
    policy: SandboxPolicy,
    cached: Option<(u64, Arc<str>)>,
    compositions: u64,
}

impl PreviewRenderer {
    #[must_use]
    pub fn new(policy: SandboxPolicy) -> Self {
        Self {
            policy,
            cached: None,
            compositions: 0,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &SandboxPolicy {
        &self.policy
    }

    pub fn render(&mut self, revision: u64, artifact: Option<&GameArtifact>) -> PreviewFrame {
        let Some(artifact) = artifact else {
            self.cached = None;
            return PreviewFrame::Placeholder;
        };

        let document = match &self.cached {
            Some((cached_revision, document)) if *cached_revision == revision => document.clone(),
            _ => {
                let document: Arc<str> = Arc::from(export::compose_document(artifact));
                self.compositions += 1;
                self.cached = Some((revision, document.clone()));
                document
            }
        };

        PreviewFrame::Sandboxed {
            document,
            policy: self.policy.clone(),
        }
    }

    /// How many documents have been composed so far.
    #[must_use]
    pub fn compositions(&self) -> u64 {
        self.compositions
    }
}

/// The `<iframe>` element that hosts a preview document served at `src`.
#[must_use]
pub fn iframe_tag(src: &str, policy: &SandboxPolicy) -> String {
    format!(
        "<iframe src=\"{}\" title=\"Game Preview\" sandbox=\"{}\"></iframe>",
        export::html_escape(src),
        policy.iframe_attribute()
    )
}
