//! Standalone HTML documents built from a [`GameArtifact`].
//!
//! The same document is used for the sandboxed preview and for the exported
//! file, so what the user plays in the preview is what they download.

use crate::GameArtifact;

pub const MIME_TYPE: &str = "text/html";

const HEAD: &str = "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n<title>";
const TITLE_CLOSE_STYLE_OPEN: &str = "</title>\n<style>\n";
const STYLE_CLOSE_BODY_OPEN: &str = "\n</style>\n</head>\n<body>\n";
const SCRIPT_OPEN: &str = "\n<script>\n";
const TAIL: &str = "\n</script>\n</body>\n</html>\n";

/// A file ready to be handed to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub contents: String,
}

/// Compose the complete document: title and style in the head, markup and
/// script in the body. The fragments are embedded verbatim.
#[must_use]
pub fn compose_document(artifact: &GameArtifact) -> String {
    let title = html_escape(&artifact.name);
    let mut doc = String::with_capacity(
        HEAD.len()
            + title.len()
            + artifact.style.len()
            + artifact.markup.len()
            + artifact.script.len()
            + 128,
    );
    doc.push_str(HEAD);
    doc.push_str(&title);
    doc.push_str(TITLE_CLOSE_STYLE_OPEN);
    doc.push_str(&artifact.style);
    doc.push_str(STYLE_CLOSE_BODY_OPEN);
    doc.push_str(&artifact.markup);
    doc.push_str(SCRIPT_OPEN);
    doc.push_str(&artifact.script);
    doc.push_str(TAIL);
    doc
}

/// `"Space Raiders!!"` becomes `"space_raiders!!.html"`: lowercase, every
/// run of whitespace collapsed to one underscore, punctuation kept.
#[must_use]
pub fn export_filename(name: &str) -> String {
    let mut filename = String::with_capacity(name.len() + 5);
    let mut in_whitespace = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                filename.push('_');
            }
            in_whitespace = true;
        } else {
            filename.extend(c.to_lowercase());
            in_whitespace = false;
        }
    }
    filename.push_str(".html");
    filename
}

#[must_use]
pub fn assemble(artifact: &GameArtifact) -> ExportFile {
    ExportFile {
        filename: export_filename(&artifact.name),
        contents: compose_document(artifact),
    }
}

/// Recover the artifact from a document produced by [`compose_document`].
///
/// Returns `None` for documents of any other shape. A script that itself
/// contains the line `<script>` cannot be told apart from the body markup
/// and is not recovered faithfully.
#[must_use]
pub fn extract_artifact(document: &str) -> Option<GameArtifact> {
    let rest = document.strip_prefix(HEAD)?.strip_suffix(TAIL)?;
    let (title, rest) = rest.split_once(TITLE_CLOSE_STYLE_OPEN)?;
    let (style, body) = rest.split_once(STYLE_CLOSE_BODY_OPEN)?;
    let (markup, script) = body.rsplit_once(SCRIPT_OPEN)?;

    Some(GameArtifact {
        name: html_unescape(title),
        markup: markup.to_string(),
        style: style.to_string(),
        script: script.to_string(),
    })
}

/// Escape text for use in HTML content and double-quoted attributes.
#[must_use]
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn html_unescape(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
}
