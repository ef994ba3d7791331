use gameforge::{
    gameforge_test::{MockGenerateResult, MockLanguageModel},
    preview::PreviewFrame,
    AllowAll, ArtifactField, AuthGate, Caller, DenyAll, GameArtifact, GameGenerator,
    GenerateTrigger, GenerationStatus, IgnoreReason, LanguageModel, LanguageModelError,
    LanguageModelInput, LanguageModelResult, Message, ModelResponse, Part, Studio, StudioError,
    StudioSession, WorkspaceView,
};
use std::{sync::Arc, time::Duration};

const SNAKE_ANSWER: &str = r#"{
  "name": "Snake Classic",
  "markup": "<canvas id='c'></canvas>",
  "style": "body{margin:0}",
  "script": "// game loop",
  "explanation": "This uses the canvas API..."
}"#;

fn studio_with(
    model: &Arc<MockLanguageModel>,
    gate: impl AuthGate + 'static,
    prompt: &str,
) -> Studio {
    Studio::with_session(
        GameGenerator::new(model.clone()),
        Arc::new(gate),
        StudioSession::new(prompt),
    )
}

fn snake() -> GameArtifact {
    GameArtifact::new(
        "Snake Classic",
        "<canvas id='c'></canvas>",
        "body{margin:0}",
        "// game loop",
    )
}

#[tokio::test]
async fn generates_a_game_from_the_prompt() {
    let model = Arc::new(MockLanguageModel::new());
    model.enqueue_generate(MockGenerateResult::text(SNAKE_ANSWER));
    let studio = studio_with(&model, AllowAll, "A classic Snake game");

    let trigger = studio
        .generate(&Caller::anonymous())
        .await
        .expect("caller is allowed");

    assert_eq!(
        trigger,
        GenerateTrigger::Completed(GenerationStatus::Succeeded)
    );
    let snapshot = studio.snapshot().await;
    assert_eq!(snapshot.status, GenerationStatus::Succeeded);
    assert_eq!(snapshot.artifact, Some(snake()));
    assert_eq!(snapshot.explanation, "This uses the canvas API...");
    assert_eq!(snapshot.error, None);
    assert!(snapshot.can_export);

    let inputs = model.tracked_generate_inputs();
    assert_eq!(inputs.len(), 1);
    assert_eq!(
        inputs[0].messages,
        vec![Message::user("User prompt: \"A classic Snake game\"")]
    );
    assert!(inputs[0].system_prompt.is_some());
    assert!(inputs[0].response_format.is_some());
}

#[tokio::test]
async fn provider_failure_is_reported_to_the_user() {
    let model = Arc::new(MockLanguageModel::new());
    model.enqueue_generate(MockGenerateResult::error(LanguageModelError::StatusCode(
        reqwest::StatusCode::GATEWAY_TIMEOUT,
        "timeout".to_string(),
    )));
    let studio = studio_with(&model, AllowAll, "A classic Snake game");

    let trigger = studio
        .generate(&Caller::anonymous())
        .await
        .expect("caller is allowed");

    assert_eq!(trigger, GenerateTrigger::Completed(GenerationStatus::Failed));
    let snapshot = studio.snapshot().await;
    assert_eq!(snapshot.artifact, None);
    let error = snapshot.error.expect("error banner is shown");
    assert!(error.starts_with("Failed to generate game from AI:"));
    assert!(error.contains("timeout"));
    assert_eq!(snapshot.explanation, error);
    assert!(!snapshot.can_export);
}

#[tokio::test]
async fn unusable_answer_fails_the_generation() {
    let model = Arc::new(MockLanguageModel::new());
    model
        .enqueue_generate(MockGenerateResult::text("Sure! Here is your game."))
        .enqueue_generate(MockGenerateResult::text("   "));
    let studio = studio_with(&model, AllowAll, "Pong");

    for _ in 0..2 {
        let trigger = studio
            .generate(&Caller::anonymous())
            .await
            .expect("caller is allowed");
        assert_eq!(trigger, GenerateTrigger::Completed(GenerationStatus::Failed));
        let error = studio.snapshot().await.error.expect("error banner is shown");
        assert!(error.starts_with("Failed to generate game from AI:"));
    }
}

#[tokio::test]
async fn empty_prompt_never_reaches_the_model() {
    let model = Arc::new(MockLanguageModel::new());
    let studio = studio_with(&model, AllowAll, "");

    let trigger = studio
        .generate(&Caller::anonymous())
        .await
        .expect("caller is allowed");

    assert_eq!(trigger, GenerateTrigger::Ignored(IgnoreReason::EmptyPrompt));
    assert!(model.tracked_generate_inputs().is_empty());
    assert_eq!(studio.snapshot().await.status, GenerationStatus::Idle);
}

#[tokio::test]
async fn unauthenticated_callers_cannot_generate() {
    let model = Arc::new(MockLanguageModel::new());
    let studio = studio_with(&model, DenyAll, "A classic Snake game");
    let before = studio.snapshot().await;

    let result = studio.generate(&Caller::with_token("expired")).await;

    assert_eq!(result, Err(StudioError::Unauthorized));
    assert!(model.tracked_generate_inputs().is_empty());
    assert_eq!(studio.snapshot().await, before);
}

#[tokio::test]
async fn second_trigger_while_generating_is_a_no_op() {
    let model = Arc::new(MockLanguageModel::new());
    let pending = model.enqueue_pending();
    let studio = studio_with(&model, AllowAll, "A classic Snake game");
    let caller = Caller::anonymous();

    let first = studio.generate(&caller);
    let second = async {
        while studio.snapshot().await.status != GenerationStatus::Generating {
            tokio::task::yield_now().await;
        }
        studio.set_prompt("A brick breaker game like Arkanoid").await;
        let during = studio.snapshot().await;
        let trigger = studio.generate(&caller).await;
        assert_eq!(studio.snapshot().await, during);
        assert!(matches!(studio.export().await, Err(StudioError::ExportUnavailable)));
        pending.resolve(Ok(gameforge::ModelResponse {
            content: vec![Part::text(SNAKE_ANSWER)],
            usage: None,
        }));
        trigger
    };

    let (first, second) = tokio::join!(first, second);

    assert_eq!(
        first,
        Ok(GenerateTrigger::Completed(GenerationStatus::Succeeded))
    );
    assert_eq!(
        second,
        Ok(GenerateTrigger::Ignored(IgnoreReason::AlreadyGenerating))
    );
    assert_eq!(model.tracked_generate_inputs().len(), 1);
    let snapshot = studio.snapshot().await;
    assert_eq!(snapshot.artifact, Some(snake()));
    assert_eq!(snapshot.prompt, "A brick breaker game like Arkanoid");
}

async fn wait_until_settled(studio: &Studio) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while studio.snapshot().await.status == GenerationStatus::Generating {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("generation settles");
}

#[tokio::test]
async fn abandoned_trigger_still_settles_the_generation() {
    let model = Arc::new(MockLanguageModel::new());
    let pending = model.enqueue_pending();
    model.enqueue_generate(MockGenerateResult::text(SNAKE_ANSWER));
    let studio = studio_with(&model, AllowAll, "A classic Snake game");
    let caller = Caller::anonymous();

    let abandoned =
        tokio::time::timeout(Duration::from_millis(20), studio.generate(&caller)).await;
    assert!(abandoned.is_err());
    assert_eq!(studio.snapshot().await.status, GenerationStatus::Generating);

    pending.resolve(Ok(ModelResponse {
        content: vec![Part::text(SNAKE_ANSWER)],
        usage: None,
    }));
    wait_until_settled(&studio).await;

    let snapshot = studio.snapshot().await;
    assert_eq!(snapshot.status, GenerationStatus::Succeeded);
    assert_eq!(snapshot.artifact, Some(snake()));
    assert!(studio.export().await.is_ok());

    assert_eq!(
        studio.generate(&caller).await,
        Ok(GenerateTrigger::Completed(GenerationStatus::Succeeded))
    );
    assert_eq!(model.tracked_generate_inputs().len(), 2);
}

#[tokio::test]
async fn abandoned_trigger_settles_a_failure_too() {
    let model = Arc::new(MockLanguageModel::new());
    let pending = model.enqueue_pending();
    let studio = studio_with(&model, AllowAll, "A classic Snake game");

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        studio.generate(&Caller::anonymous()),
    )
    .await;
    assert!(abandoned.is_err());

    pending.resolve(Err(LanguageModelError::Refusal("quota".to_string())));
    wait_until_settled(&studio).await;

    let snapshot = studio.snapshot().await;
    assert_eq!(snapshot.status, GenerationStatus::Failed);
    assert!(snapshot
        .error
        .expect("error banner is shown")
        .starts_with("Failed to generate game from AI:"));
}

struct PanickingModel;

#[async_trait::async_trait]
impl LanguageModel for PanickingModel {
    fn provider(&self) -> &'static str {
        "panicking"
    }

    fn model_id(&self) -> String {
        "panicking".to_string()
    }

    async fn generate(&self, _input: LanguageModelInput) -> LanguageModelResult<ModelResponse> {
        panic!("model exploded")
    }
}

#[tokio::test]
async fn generator_panic_becomes_a_failure() {
    let studio = Studio::with_session(
        GameGenerator::new(Arc::new(PanickingModel)),
        Arc::new(AllowAll),
        StudioSession::new("Pong"),
    );

    let trigger = studio
        .generate(&Caller::anonymous())
        .await
        .expect("caller is allowed");

    assert_eq!(trigger, GenerateTrigger::Completed(GenerationStatus::Failed));
    let error = studio.snapshot().await.error.expect("error banner is shown");
    assert!(error.starts_with("Failed to generate game from AI:"));
}

#[tokio::test]
async fn new_generation_discards_the_previous_game() {
    let model = Arc::new(MockLanguageModel::new());
    model.enqueue_generate(MockGenerateResult::text(SNAKE_ANSWER));
    let pending = model.enqueue_pending();
    let studio = studio_with(&model, AllowAll, "A classic Snake game");
    let caller = Caller::anonymous();

    studio.generate(&caller).await.expect("caller is allowed");
    studio.switch_view(WorkspaceView::Code).await;

    let regenerate = studio.generate(&caller);
    let observe = async {
        while studio.snapshot().await.status != GenerationStatus::Generating {
            tokio::task::yield_now().await;
        }
        let during = studio.snapshot().await;
        assert_eq!(during.artifact, None);
        assert_eq!(during.explanation, "");
        assert_eq!(during.view, WorkspaceView::Preview);
        assert_eq!(studio.preview().await, PreviewFrame::Placeholder);
        pending.resolve(Err(LanguageModelError::Refusal("quota".to_string())));
    };
    let (result, ()) = tokio::join!(regenerate, observe);

    assert_eq!(
        result,
        Ok(GenerateTrigger::Completed(GenerationStatus::Failed))
    );
}

#[tokio::test]
async fn edits_flow_into_preview_and_export() {
    let model = Arc::new(MockLanguageModel::new());
    model.enqueue_generate(MockGenerateResult::text(SNAKE_ANSWER));
    let studio = studio_with(&model, AllowAll, "A classic Snake game");
    studio
        .generate(&Caller::anonymous())
        .await
        .expect("caller is allowed");

    let PreviewFrame::Sandboxed { document: before, .. } = studio.preview().await else {
        panic!("expected a sandboxed preview");
    };
    let PreviewFrame::Sandboxed { document: again, .. } = studio.preview().await else {
        panic!("expected a sandboxed preview");
    };
    assert!(Arc::ptr_eq(&before, &again));

    studio
        .edit_artifact(ArtifactField::Script, "requestAnimationFrame(loop);")
        .await
        .expect("artifact exists");

    let PreviewFrame::Sandboxed { document: after, .. } = studio.preview().await else {
        panic!("expected a sandboxed preview");
    };
    assert!(after.contains("requestAnimationFrame(loop);"));
    assert!(!after.contains("// game loop"));

    let file = studio.export().await.expect("artifact exists");
    assert_eq!(file.filename, "snake_classic.html");
    assert_eq!(file.contents, &*after);
    assert_eq!(studio.snapshot().await.status, GenerationStatus::Succeeded);
}

#[tokio::test]
async fn switching_views_keeps_the_game() {
    let model = Arc::new(MockLanguageModel::new());
    model.enqueue_generate(MockGenerateResult::text(SNAKE_ANSWER));
    let studio = studio_with(&model, AllowAll, "A classic Snake game");
    studio
        .generate(&Caller::anonymous())
        .await
        .expect("caller is allowed");
    let before = studio.snapshot().await;

    for view in [
        WorkspaceView::Code,
        WorkspaceView::Scene,
        WorkspaceView::Preview,
    ] {
        studio.switch_view(view).await;
    }

    let after = studio.snapshot().await;
    assert_eq!(after.artifact, before.artifact);
    assert_eq!(after.revision, before.revision);
    assert_eq!(after.view, WorkspaceView::Preview);
}

#[tokio::test]
async fn nothing_to_edit_or_export_before_a_game_exists() {
    let model = Arc::new(MockLanguageModel::new());
    let studio = studio_with(&model, AllowAll, "Pong");

    assert_eq!(
        studio.edit_artifact(ArtifactField::Markup, "<canvas></canvas>").await,
        Err(StudioError::NoArtifact)
    );
    assert_eq!(studio.export().await, Err(StudioError::ExportUnavailable));
    assert_eq!(studio.preview().await, PreviewFrame::Placeholder);
}

#[tokio::test]
async fn dismissing_the_error_hides_only_the_banner() {
    let model = Arc::new(MockLanguageModel::new());
    model.enqueue_generate(MockGenerateResult::error(LanguageModelError::Refusal(
        "prompt blocked (SAFETY)".to_string(),
    )));
    let studio = studio_with(&model, AllowAll, "Pong");
    studio
        .generate(&Caller::anonymous())
        .await
        .expect("caller is allowed");

    studio.dismiss_error().await;

    let snapshot = studio.snapshot().await;
    assert_eq!(snapshot.error, None);
    assert!(snapshot.explanation.contains("prompt blocked (SAFETY)"));
    assert_eq!(snapshot.status, GenerationStatus::Failed);
}
