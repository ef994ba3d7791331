use dotenvy::dotenv;
use gameforge::{export, GameGenerator};

mod common;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let prompt = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "A brick breaker game like Arkanoid".to_string());

    let game = GameGenerator::new(common::get_model())
        .try_generate(&prompt)
        .await
        .unwrap();

    println!("{}\n\n{}", game.artifact.name, game.explanation);

    let file = export::assemble(&game.artifact);
    std::fs::write(&file.filename, &file.contents).unwrap();
    println!("\nSaved to {}", file.filename);
}
