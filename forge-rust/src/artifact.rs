use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// A generated game: its display name and the three code fragments it is
/// made of.
///
/// Artifacts are never mutated in place. An edit produces a new value through
/// [`GameArtifact::with_field`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameArtifact {
    /// Display name, also the base of the export filename.
    pub name: String,
    /// HTML fragment placed in the document body, commonly a single canvas.
    pub markup: String,
    /// CSS placed in a head-level style block.
    pub style: String,
    /// JavaScript placed in a body-level script block.
    pub script: String,
}

impl GameArtifact {
    pub fn new(
        name: impl Into<String>,
        markup: impl Into<String>,
        style: impl Into<String>,
        script: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            markup: markup.into(),
            style: style.into(),
            script: script.into(),
        }
    }

    #[must_use]
    pub fn field(&self, field: ArtifactField) -> &str {
        match field {
            ArtifactField::Markup => &self.markup,
            ArtifactField::Style => &self.style,
            ArtifactField::Script => &self.script,
        }
    }

    /// Returns a copy of this artifact with exactly one code field replaced.
    #[must_use]
    pub fn with_field(&self, field: ArtifactField, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        let value = value.into();
        match field {
            ArtifactField::Markup => next.markup = value,
            ArtifactField::Style => next.style = value,
            ArtifactField::Script => next.script = value,
        }
        next
    }
}

/// The code fields editable from the Code view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactField {
    Markup,
    Style,
    Script,
}

impl ArtifactField {
    pub const ALL: [Self; 3] = [Self::Markup, Self::Style, Self::Script];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Markup => "markup",
            Self::Style => "style",
            Self::Script => "script",
        }
    }

    /// Label shown above the editor for this field.
    #[must_use]
    pub fn language(self) -> &'static str {
        match self {
            Self::Markup => "HTML",
            Self::Style => "CSS",
            Self::Script => "JavaScript",
        }
    }
}

impl fmt::Display for ArtifactField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markup" => Ok(Self::Markup),
            "style" => Ok(Self::Style),
            "script" => Ok(Self::Script),
            other => Err(format!("unknown artifact field: {other}")),
        }
    }
}
