use gameforge::{
    google::{GoogleModel, GoogleModelOptions, DEFAULT_MODEL_ID},
    LanguageModel,
};
use std::sync::Arc;

pub fn get_model() -> Arc<dyn LanguageModel + Send + Sync> {
    let model_id = std::env::var("GAMEFORGE_MODEL").unwrap_or_else(|_| DEFAULT_MODEL_ID.to_string());
    Arc::new(GoogleModel::new(
        model_id,
        GoogleModelOptions {
            api_key: std::env::var("GOOGLE_API_KEY")
                .expect("GOOGLE_API_KEY environment variable must be set"),
            ..Default::default()
        },
    ))
}
