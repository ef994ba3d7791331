use dotenvy::dotenv;
use gameforge::{
    preview::PreviewFrame, AllowAll, ArtifactField, Caller, GameGenerator, Studio,
    WorkspaceView,
};
use std::sync::Arc;

mod common;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let studio = Studio::new(GameGenerator::new(common::get_model()), Arc::new(AllowAll));
    studio.set_prompt("A clicker game where you earn points").await;

    let trigger = studio.generate(&Caller::anonymous()).await.unwrap();
    println!("{trigger:?}");

    let snapshot = studio.snapshot().await;
    if let Some(error) = &snapshot.error {
        println!("{error}");
        return;
    }

    studio.switch_view(WorkspaceView::Code).await;
    studio
        .edit_artifact(
            ArtifactField::Style,
            "body { background: #222; color: #fff; }",
        )
        .await
        .unwrap();

    if let PreviewFrame::Sandboxed { document, policy } = studio.preview().await {
        println!("sandbox=\"{policy}\"\n{document}");
    }
}
