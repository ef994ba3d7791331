//! Server-rendered pages: the public landing and auth pages and the
//! workspace, whose script talks to the JSON API.

use crate::{
    auth::{caller_from_headers, clear_session_cookie_header, session_cookie_header},
    server::AppState,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use gameforge::{
    export::html_escape, preview::iframe_tag, preview::SandboxPolicy, ArtifactField, Caller,
    SessionSnapshot, Studio, WorkspaceView,
};
use serde::Deserialize;

pub const EXAMPLE_PROMPTS: [&str; 5] = [
    "A classic Snake game",
    "A brick breaker game like Arkanoid",
    "A top-down car driving on a road",
    "A simple platformer with one moving platform",
    "A clicker game where you earn points",
];

pub const ASSISTANT_HINT: &str = "The AI will provide an explanation of the generated code here.";

/// Signed-in users get a fresh workspace on every load.
pub async fn home_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let caller = caller_from_headers(&headers);
    match state.workspaces.reopen(&caller).await {
        Some(studio) => workspace(&studio).await,
        None => Html(landing_page()).into_response(),
    }
}

/// Every other path is the workspace for signed-in users.
pub async fn fallback_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let caller = caller_from_headers(&headers);
    match state.workspaces.reopen(&caller).await {
        Some(studio) => workspace(&studio).await,
        None => Redirect::to("/sign-in").into_response(),
    }
}

pub async fn sign_in_page_handler() -> Html<String> {
    Html(sign_in_page(None))
}

#[derive(Deserialize)]
pub struct SignInForm {
    token: String,
}

pub async fn sign_in_handler(
    State(state): State<AppState>,
    Form(form): Form<SignInForm>,
) -> Response {
    let token = form.token.trim();
    if !token.is_empty()
        && state
            .workspaces
            .is_authenticated(&Caller::with_token(token))
            .await
    {
        tracing::info!("signed in");
        return (
            [(
                header::SET_COOKIE,
                session_cookie_header(token, state.secure_cookies),
            )],
            Redirect::to("/"),
        )
            .into_response();
    }

    tracing::warn!("sign-in rejected");
    (
        StatusCode::UNAUTHORIZED,
        Html(sign_in_page(Some("That access token is not valid."))),
    )
        .into_response()
}

pub async fn sign_up_handler() -> Html<String> {
    Html(sign_up_page())
}

pub async fn sign_out_handler() -> Response {
    (
        [(header::SET_COOKIE, clear_session_cookie_header())],
        Redirect::to("/"),
    )
        .into_response()
}

async fn workspace(studio: &Studio) -> Response {
    let snapshot = studio.snapshot().await;
    let policy = studio.sandbox_policy().await;
    Html(workspace_page(&snapshot, &policy)).into_response()
}

fn layout(title: &str, body: &str) -> String {
    let mut page = String::with_capacity(STYLE.len() + body.len() + 256);
    page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\">\n");
    page.push_str(
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n<title>",
    );
    page.push_str(&html_escape(title));
    page.push_str("</title>\n<style>\n");
    page.push_str(STYLE);
    page.push_str("</style>\n</head>\n<body>\n");
    page.push_str(body);
    page.push_str("\n</body>\n</html>\n");
    page
}

#[must_use]
pub fn landing_page() -> String {
    layout(
        "GameForge",
        r#"<main class="center">
<h1>GameForge</h1>
<p class="tagline">Describe a game. Play it in seconds.</p>
<p>GameForge turns a sentence into a playable HTML5 canvas game, explains the code it wrote, and lets you edit and download it.</p>
<p class="actions"><a class="button" href="/sign-in">Sign in</a> <a class="button secondary" href="/sign-up">Sign up</a></p>
</main>"#,
    )
}

#[must_use]
pub fn sign_in_page(error: Option<&str>) -> String {
    let mut body = String::from("<main class=\"center\">\n<h1>Sign in</h1>\n");
    if let Some(error) = error {
        body.push_str("<p class=\"form-error\">");
        body.push_str(&html_escape(error));
        body.push_str("</p>\n");
    }
    body.push_str(
        r#"<form method="post" action="/sign-in">
<label for="token">Access token</label>
<input id="token" name="token" type="password" autocomplete="current-password" required>
<button type="submit">Sign in</button>
</form>
<p><a href="/sign-up">Need an account?</a></p>
</main>"#,
    );
    layout("Sign in - GameForge", &body)
}

#[must_use]
pub fn sign_up_page() -> String {
    layout(
        "Sign up - GameForge",
        r#"<main class="center">
<h1>Sign up</h1>
<p>GameForge accounts are issued by your organization's identity provider. Ask your administrator for an access token, then sign in with it.</p>
<p class="actions"><a class="button" href="/sign-in">Sign in</a></p>
</main>"#,
    )
}

/// The workspace as first rendered. The embedded script keeps it in sync
/// with the session afterwards.
#[must_use]
pub fn workspace_page(snapshot: &SessionSnapshot, policy: &SandboxPolicy) -> String {
    let mut body = String::with_capacity(16 * 1024);

    body.push_str(
        r#"<header class="topbar">
<span class="brand">GameForge</span>
<span id="game-name" class="game-name"></span>
<span class="spacer"></span>
<button id="export" type="button" disabled>Export</button>
<a class="signout" href="/sign-out">Sign out</a>
</header>
<div id="error-banner" class="error-banner" role="alert" hidden>
<strong>Error Generating Game</strong>
<span id="error-message"></span>
<button id="dismiss" type="button" aria-label="Dismiss">&times;</button>
</div>
<div class="workspace">
<aside class="sidebar">
<label for="prompt">Describe your game</label>
<textarea id="prompt" rows="5">"#,
    );
    body.push_str(&html_escape(&snapshot.prompt));
    body.push_str("</textarea>\n<div class=\"examples\">\n");
    for example in EXAMPLE_PROMPTS {
        let example = html_escape(example);
        body.push_str(&format!(
            "<button type=\"button\" class=\"example\" data-prompt=\"{example}\">{example}</button>\n"
        ));
    }
    body.push_str(
        r#"</div>
<button id="generate" type="button" class="primary">Generate</button>
<h2>Assistant</h2>
<div id="assistant" class="assistant"></div>
</aside>
<section class="main">
<nav class="tabs">
"#,
    );
    for view in WorkspaceView::ALL {
        body.push_str(&format!(
            "<button type=\"button\" data-view=\"{}\">{}</button>\n",
            view.as_str(),
            view.label()
        ));
    }
    body.push_str("</nav>\n<div class=\"pane\" data-pane=\"preview\">\n");
    body.push_str(&iframe_tag(
        &format!("/preview?revision={}", snapshot.revision),
        policy,
    ));
    body.push_str("\n</div>\n<div class=\"pane code\" data-pane=\"code\" hidden>\n");
    for field in ArtifactField::ALL {
        body.push_str(&format!(
            "<label for=\"editor-{field}\">{}</label>\n\
             <textarea id=\"editor-{field}\" data-field=\"{field}\" spellcheck=\"false\"></textarea>\n",
            field.language()
        ));
    }
    body.push_str(
        r#"</div>
<div class="pane scene" data-pane="scene" hidden>
<p>Visual scene editing is coming soon.</p>
</div>
</section>
</div>
<script type="application/json" id="initial-state">"#,
    );
    body.push_str(&embedded_json(snapshot));
    body.push_str("</script>\n<script>\nconst HINT = \"");
    body.push_str(ASSISTANT_HINT);
    body.push_str("\";\n");
    body.push_str(WORKSPACE_SCRIPT);
    body.push_str("</script>");

    layout("GameForge", &body)
}

/// JSON that is safe inside a `<script>` element.
fn embedded_json(snapshot: &SessionSnapshot) -> String {
    serde_json::to_string(snapshot)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
}

const STYLE: &str = r"* { box-sizing: border-box; }
body { margin: 0; font-family: system-ui, sans-serif; background: #0f1117; color: #e6e6e6; }
a { color: #8ab4ff; }
button, .button { font: inherit; padding: 0.45rem 0.9rem; border-radius: 6px; border: 1px solid #3a3f4b; background: #1c2030; color: inherit; cursor: pointer; text-decoration: none; }
button:disabled { opacity: 0.5; cursor: not-allowed; }
button.primary, .button { background: #4f6bff; border-color: #4f6bff; color: #fff; }
.button.secondary { background: transparent; color: #8ab4ff; }
.center { max-width: 32rem; margin: 10vh auto; padding: 0 1rem; }
.tagline { font-size: 1.2rem; color: #aab; }
.form-error { color: #ff8a8a; }
form { display: flex; flex-direction: column; gap: 0.6rem; }
input, textarea { font: inherit; padding: 0.5rem; border-radius: 6px; border: 1px solid #3a3f4b; background: #151925; color: inherit; }
.topbar { display: flex; align-items: center; gap: 1rem; padding: 0.6rem 1rem; border-bottom: 1px solid #252a36; }
.brand { font-weight: 700; }
.game-name { color: #aab; }
.spacer { flex: 1; }
.error-banner { display: flex; gap: 0.8rem; align-items: center; padding: 0.6rem 1rem; background: #3b1518; color: #ffb3b3; }
.error-banner[hidden] { display: none; }
.error-banner button { margin-left: auto; background: transparent; border: none; }
.workspace { display: grid; grid-template-columns: 22rem 1fr; height: calc(100vh - 3rem); }
.sidebar { display: flex; flex-direction: column; gap: 0.6rem; padding: 1rem; border-right: 1px solid #252a36; overflow: auto; }
.examples { display: flex; flex-wrap: wrap; gap: 0.4rem; }
.example { font-size: 0.8rem; padding: 0.25rem 0.6rem; }
.assistant { white-space: pre-wrap; color: #ccd; }
.assistant.thinking { color: #8ab4ff; }
.main { display: flex; flex-direction: column; min-width: 0; }
.tabs { display: flex; gap: 0.3rem; padding: 0.6rem 1rem; }
.tabs .active { background: #4f6bff; border-color: #4f6bff; }
.pane { flex: 1; padding: 0 1rem 1rem; display: flex; flex-direction: column; gap: 0.4rem; }
.pane[hidden] { display: none; }
.pane iframe { flex: 1; width: 100%; border: 1px solid #252a36; border-radius: 6px; background: #000; }
.pane.code textarea { flex: 1; font-family: ui-monospace, monospace; font-size: 0.85rem; }
.pane.scene { align-items: center; justify-content: center; color: #889; }
";

const WORKSPACE_SCRIPT: &str = r#"const $ = (id) => document.getElementById(id);
let state = JSON.parse($("initial-state").textContent);
let shownRevision = state.revision;
const editTimers = {};
let promptTimer = null;

async function api(method, path, body) {
  const init = { method, credentials: "same-origin", headers: {} };
  if (body !== undefined) {
    init.headers["content-type"] = "application/json";
    init.body = JSON.stringify(body);
  }
  const res = await fetch(path, init);
  if (res.status === 401) {
    window.location.href = "/sign-in";
    throw new Error("Signed out");
  }
  const data = await res.json();
  if (!res.ok) throw new Error(data.error || res.statusText);
  return data;
}

function showLocalError(error) {
  $("error-message").textContent = error.message;
  $("error-banner").hidden = false;
}

function render(next) {
  state = next;
  const generating = state.status === "generating";
  const prompt = $("prompt");
  if (document.activeElement !== prompt) prompt.value = state.prompt;
  $("generate").disabled = generating || prompt.value.length === 0;
  $("generate").textContent = generating ? "Generating..." : "Generate";
  $("export").disabled = !state.can_export;
  const assistant = $("assistant");
  assistant.classList.toggle("thinking", generating);
  assistant.textContent = generating ? "Thinking..." : (state.explanation || HINT);
  $("error-banner").hidden = state.error === null;
  $("error-message").textContent = state.error || "";
  $("game-name").textContent = state.artifact ? state.artifact.name : "";
  for (const tab of document.querySelectorAll("[data-view]")) {
    tab.classList.toggle("active", tab.dataset.view === state.view);
  }
  for (const pane of document.querySelectorAll("[data-pane]")) {
    pane.hidden = pane.dataset.pane !== state.view;
  }
  for (const editor of document.querySelectorAll("[data-field]")) {
    editor.disabled = state.artifact === null;
    if (document.activeElement !== editor) {
      editor.value = state.artifact ? state.artifact[editor.dataset.field] : "";
    }
  }
  if (state.revision !== shownRevision) {
    shownRevision = state.revision;
    document.querySelector("[data-pane=preview] iframe").src = "/preview?revision=" + state.revision;
  }
}

async function savePrompt() {
  clearTimeout(promptTimer);
  promptTimer = null;
  render(await api("PUT", "/api/prompt", { prompt: $("prompt").value }));
}

$("prompt").addEventListener("input", () => {
  $("generate").disabled = state.status === "generating" || $("prompt").value.length === 0;
  clearTimeout(promptTimer);
  promptTimer = setTimeout(() => savePrompt().catch(showLocalError), 300);
});

for (const example of document.querySelectorAll(".example")) {
  example.addEventListener("click", () => {
    $("prompt").value = example.dataset.prompt;
    savePrompt().catch(showLocalError);
  });
}

$("generate").addEventListener("click", async () => {
  try {
    await savePrompt();
    const pending = api("POST", "/api/generate");
    setTimeout(() => api("GET", "/api/session").then((s) => { if (s.status === "generating") render(s); }).catch(() => {}), 150);
    const result = await pending;
    render(result.session);
  } catch (error) {
    showLocalError(error);
  }
});

for (const tab of document.querySelectorAll("[data-view]")) {
  tab.addEventListener("click", () => {
    api("PUT", "/api/view", { view: tab.dataset.view }).then(render).catch(showLocalError);
  });
}

for (const editor of document.querySelectorAll("[data-field]")) {
  editor.addEventListener("input", () => {
    const field = editor.dataset.field;
    clearTimeout(editTimers[field]);
    editTimers[field] = setTimeout(() => {
      api("PUT", "/api/artifact/" + field, { value: editor.value }).then(render).catch(showLocalError);
    }, 400);
  });
}

$("dismiss").addEventListener("click", () => {
  api("POST", "/api/error/dismiss").then(render).catch(showLocalError);
});

$("export").addEventListener("click", () => {
  window.location.href = "/export";
});

render(state);
"#;
