use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use gameforge::{
    google::{GoogleModel, GoogleModelOptions},
    GameGenerator, GenerationOutcome, LanguageModel, LanguageModelError, LanguageModelInput,
    Message,
};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    env,
    sync::{Arc, Mutex},
};

#[derive(Clone, Default)]
struct FakeGemini {
    requests: Arc<Mutex<Vec<(String, String, Value)>>>,
    reply: Arc<Mutex<Option<(StatusCode, Value)>>>,
}

impl FakeGemini {
    fn reply_with(&self, status: StatusCode, body: Value) {
        *self.reply.lock().expect("fake state poisoned") = Some((status, body));
    }

    fn requests(&self) -> Vec<(String, String, Value)> {
        self.requests.lock().expect("fake state poisoned").clone()
    }
}

async fn generate_content(
    State(fake): State<FakeGemini>,
    Path(model): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    fake.requests.lock().expect("fake state poisoned").push((
        model,
        query.get("key").cloned().unwrap_or_default(),
        body,
    ));
    let (status, reply) = fake
        .reply
        .lock()
        .expect("fake state poisoned")
        .clone()
        .unwrap_or((StatusCode::INTERNAL_SERVER_ERROR, json!({})));
    (status, Json(reply))
}

async fn start_fake_gemini() -> (FakeGemini, String) {
    let fake = FakeGemini::default();
    let app = Router::new()
        .route("/v1beta/models/{model}", post(generate_content))
        .with_state(fake.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake gemini");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake gemini serves");
    });
    (fake, format!("http://{addr}/v1beta"))
}

fn model_for(base_url: String) -> GoogleModel {
    GoogleModel::new(
        "gemini-2.5-flash",
        GoogleModelOptions {
            api_key: "test-key".to_string(),
            base_url: Some(base_url),
            ..Default::default()
        },
    )
}

fn answer(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 120, "candidatesTokenCount": 900 }
    })
}

#[tokio::test]
async fn sends_the_structured_output_request() {
    let (fake, base_url) = start_fake_gemini().await;
    fake.reply_with(
        StatusCode::OK,
        answer(r#"{"name":"Pong","markup":"<canvas></canvas>","style":"","script":"go();","explanation":"Paddles."}"#),
    );
    let generator = GameGenerator::new(Arc::new(model_for(base_url))).temperature(0.7);

    let outcome = generator.generate("A game of pong").await;

    match outcome {
        GenerationOutcome::Success {
            artifact,
            explanation,
        } => {
            assert_eq!(artifact.name, "Pong");
            assert_eq!(artifact.script, "go();");
            assert_eq!(explanation, "Paddles.");
        }
        GenerationOutcome::Failure { message } => panic!("unexpected failure: {message}"),
    }

    let requests = fake.requests();
    assert_eq!(requests.len(), 1);
    let (model, key, body) = &requests[0];
    assert_eq!(model, "gemini-2.5-flash:generateContent");
    assert_eq!(key, "test-key");
    assert_eq!(
        body["contents"],
        json!([{ "role": "user", "parts": [{ "text": "User prompt: \"A game of pong\"" }] }])
    );
    assert_eq!(body["systemInstruction"]["role"], "system");
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(body["generationConfig"]["temperature"], 0.7);
    assert_eq!(
        body["generationConfig"]["responseJsonSchema"]["required"],
        json!(["name", "markup", "style", "script", "explanation"])
    );
}

#[tokio::test]
async fn maps_usage_and_drops_thoughts() {
    let (fake, base_url) = start_fake_gemini().await;
    fake.reply_with(
        StatusCode::OK,
        json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [
                        { "text": "Let me think about paddles.", "thought": true },
                        { "text": "{\"name\":\"Pong\"}" }
                    ]
                }
            }],
            "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 20 }
        }),
    );

    let response = model_for(base_url)
        .generate(LanguageModelInput {
            messages: vec![Message::user("hi")],
            ..LanguageModelInput::default()
        })
        .await
        .expect("generate succeeds");

    assert_eq!(response.text(), "{\"name\":\"Pong\"}");
    let usage = response.usage.expect("usage is reported");
    assert_eq!(usage.input_tokens, 10);
    assert_eq!(usage.output_tokens, 20);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let (fake, base_url) = start_fake_gemini().await;
    fake.reply_with(
        StatusCode::TOO_MANY_REQUESTS,
        json!({ "error": { "message": "Resource has been exhausted" } }),
    );

    let error = model_for(base_url.clone())
        .generate(LanguageModelInput::default())
        .await
        .expect_err("quota errors surface");
    match error {
        LanguageModelError::StatusCode(status, body) => {
            assert_eq!(status, reqwest::StatusCode::TOO_MANY_REQUESTS);
            assert!(body.contains("Resource has been exhausted"));
        }
        other => panic!("unexpected error variant: {other:?}"),
    }

    let outcome = GameGenerator::new(Arc::new(model_for(base_url)))
        .generate("Pong")
        .await;
    let GenerationOutcome::Failure { message } = outcome else {
        panic!("expected a failure");
    };
    assert!(message.starts_with("Failed to generate game from AI:"));
    assert!(message.contains("429"));
}

#[tokio::test]
async fn blocked_prompt_is_a_refusal() {
    let (fake, base_url) = start_fake_gemini().await;
    fake.reply_with(
        StatusCode::OK,
        json!({ "promptFeedback": { "blockReason": "SAFETY" } }),
    );

    let error = model_for(base_url)
        .generate(LanguageModelInput::default())
        .await
        .expect_err("blocked prompts fail");

    assert!(matches!(error, LanguageModelError::Refusal(message) if message.contains("SAFETY")));
}

#[tokio::test]
async fn missing_candidates_break_an_invariant() {
    let (fake, base_url) = start_fake_gemini().await;
    fake.reply_with(StatusCode::OK, json!({ "candidates": [] }));

    let error = model_for(base_url)
        .generate(LanguageModelInput::default())
        .await
        .expect_err("no candidate fails");

    assert!(matches!(error, LanguageModelError::Invariant("google", _)));
}

#[tokio::test]
#[ignore = "calls the live Gemini API, needs GOOGLE_API_KEY"]
async fn generates_a_game_with_gemini() {
    dotenvy::dotenv().ok();
    let api_key = env::var("GOOGLE_API_KEY").expect("GOOGLE_API_KEY must be set");
    let model = GoogleModel::new(
        gameforge::google::DEFAULT_MODEL_ID,
        GoogleModelOptions {
            api_key,
            ..Default::default()
        },
    );

    let outcome = GameGenerator::new(Arc::new(model))
        .generate("A clicker game where you earn points")
        .await;

    match outcome {
        GenerationOutcome::Success { artifact, .. } => {
            assert!(!artifact.script.is_empty());
        }
        GenerationOutcome::Failure { message } => panic!("generation failed: {message}"),
    }
}
