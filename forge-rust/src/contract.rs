//! The output contract between the generation client and the model.
//!
//! The model is asked for a JSON object with five string fields. A missing or
//! empty field takes a fallback value instead of failing the whole
//! generation. Anything that is not a JSON object, or a field holding
//! something other than a string, is a [`ContractError`].

use crate::{ContractError, GameArtifact, ResponseFormatJson, ResponseFormatOption};
use serde_json::{json, Map, Value};

/// Version of the output schema below. Bump when the field set changes.
pub const CONTRACT_VERSION: u32 = 1;

pub const FALLBACK_NAME: &str = "Untitled Game";
pub const FALLBACK_EXPLANATION: &str = "No explanation provided.";

/// The fixed instruction sent with every generation.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert game developer creating \
self-contained HTML5 games. Generate the necessary HTML, CSS, and JavaScript for a \
complete, playable game based on the user's request. The entire game should be able to \
run from a single HTML file. Use vanilla JavaScript and the HTML Canvas API. Do not use \
any external libraries. Ensure the JavaScript is well-commented to help learners \
understand the logic.";

const NAME: FieldSpec = FieldSpec {
    key: "name",
    legacy_key: "gameName",
    description: "A catchy, creative name for the game, e.g., \"Pixel Python\" or \"AstroBreak\".",
};
const MARKUP: FieldSpec = FieldSpec {
    key: "markup",
    legacy_key: "html",
    description: "The HTML content for the game, typically just a canvas element. Example: \
                  '<canvas id=\"gameCanvas\" width=\"600\" height=\"400\"></canvas>'",
};
const STYLE: FieldSpec = FieldSpec {
    key: "style",
    legacy_key: "css",
    description: "The CSS for styling the game container and elements. Example: 'body { \
                  background-color: #111; display: flex; justify-content: center; \
                  align-items: center; height: 100vh; margin: 0; } canvas { border: 2px \
                  solid #eee; background-color: #000; }'",
};
const SCRIPT: FieldSpec = FieldSpec {
    key: "script",
    legacy_key: "js",
    description: "The complete, well-commented vanilla JavaScript logic for the game using \
                  the HTML Canvas API.",
};
const EXPLANATION: FieldSpec = FieldSpec {
    key: "explanation",
    legacy_key: "explanation",
    description: "A brief, friendly, and simple explanation of how the generated JavaScript \
                  code works, aimed at a beginner developer.",
};

const FIELDS: [FieldSpec; 5] = [NAME, MARKUP, STYLE, SCRIPT, EXPLANATION];

struct FieldSpec {
    key: &'static str,
    legacy_key: &'static str,
    description: &'static str,
}

/// A decoded model answer: the artifact plus the beginner-facing explanation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedGame {
    pub artifact: GameArtifact,
    pub explanation: String,
}

/// JSON schema of the expected model output.
#[must_use]
pub fn output_schema() -> Value {
    let properties: Map<String, Value> = FIELDS
        .iter()
        .map(|field| {
            (
                field.key.to_string(),
                json!({ "type": "string", "description": field.description }),
            )
        })
        .collect();
    let required: Vec<&str> = FIELDS.iter().map(|field| field.key).collect();

    json!({
        "title": format!("GameArtifact v{CONTRACT_VERSION}"),
        "type": "object",
        "properties": properties,
        "required": required,
        "propertyOrdering": required,
    })
}

/// The structured-output request for the model.
#[must_use]
pub fn response_format() -> ResponseFormatOption {
    ResponseFormatOption::Json(ResponseFormatJson {
        name: "game_artifact".to_string(),
        description: Some("A playable HTML5 canvas game and an explanation of it".to_string()),
        schema: Some(output_schema()),
    })
}

/// Decode the model's text into a [`GeneratedGame`].
pub fn decode(text: &str) -> Result<GeneratedGame, ContractError> {
    let value: Value = serde_json::from_str(strip_code_fence(text.trim()))?;
    let Value::Object(object) = value else {
        return Err(ContractError::NotAnObject);
    };

    let name = read_field(&object, &NAME)?.unwrap_or_else(|| FALLBACK_NAME.to_string());
    let markup = read_field(&object, &MARKUP)?.unwrap_or_default();
    let style = read_field(&object, &STYLE)?.unwrap_or_default();
    let script = read_field(&object, &SCRIPT)?.unwrap_or_default();
    let explanation =
        read_field(&object, &EXPLANATION)?.unwrap_or_else(|| FALLBACK_EXPLANATION.to_string());

    Ok(GeneratedGame {
        artifact: GameArtifact {
            name,
            markup,
            style,
            script,
        },
        explanation,
    })
}

/// `Ok(None)` for a field that is missing, null or empty.
fn read_field(
    object: &Map<String, Value>,
    field: &FieldSpec,
) -> Result<Option<String>, ContractError> {
    let value = object
        .get(field.key)
        .or_else(|| object.get(field.legacy_key));
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ContractError::WrongType { field: field.key }),
    }
}

/// Models sometimes wrap JSON output in a Markdown fence even when asked not
/// to.
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return text;
    };
    // Drop the info string (e.g. `json`) on the opening line.
    match body.find('\n') {
        Some(newline) => body[newline + 1..].trim(),
        None => body.trim(),
    }
}
