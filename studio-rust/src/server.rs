use crate::{api, auth::TokenGate, config::StudioConfig, pages, workspaces::Workspaces};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use gameforge::{
    google::{GoogleModel, GoogleModelOptions},
    GameGenerator,
};
use std::{io, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub workspaces: Arc<Workspaces>,
    pub secure_cookies: bool,
}

impl AppState {
    #[must_use]
    pub fn new(workspaces: Workspaces) -> Self {
        Self {
            workspaces: Arc::new(workspaces),
            secure_cookies: false,
        }
    }

    /// Mark session cookies `Secure`.
    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }
}

/// The workspaces described by `config`, talking to Gemini.
#[must_use]
pub fn build_workspaces(config: &StudioConfig) -> Workspaces {
    let model = GoogleModel::new(
        config.model_id.clone(),
        GoogleModelOptions {
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            ..Default::default()
        },
    );

    let mut generator = GameGenerator::new(Arc::new(model));
    if let Some(temperature) = config.temperature {
        generator = generator.temperature(temperature);
    }
    if let Some(max_output_tokens) = config.max_output_tokens {
        generator = generator.max_output_tokens(max_output_tokens);
    }

    Workspaces::new(
        generator,
        Arc::new(TokenGate::new(config.access_tokens.iter().cloned())),
    )
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::home_handler))
        .route(
            "/sign-in",
            get(pages::sign_in_page_handler).post(pages::sign_in_handler),
        )
        .route("/sign-up", get(pages::sign_up_handler))
        .route("/sign-out", get(pages::sign_out_handler))
        .route("/api/session", get(api::session_handler))
        .route("/api/prompt", put(api::prompt_handler))
        .route("/api/generate", post(api::generate_handler))
        .route("/api/view", put(api::view_handler))
        .route("/api/artifact/{field}", put(api::artifact_handler))
        .route("/api/error/dismiss", post(api::dismiss_error_handler))
        .route("/preview", get(api::preview_handler))
        .route("/export", get(api::export_handler))
        .fallback(pages::fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Allow the configured app origin to call the API with credentials.
pub fn cors_layer(app_url: &str) -> Result<CorsLayer, header::InvalidHeaderValue> {
    Ok(CorsLayer::new()
        .allow_origin([app_url.parse::<HeaderValue>()?])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}

pub async fn serve(config: StudioConfig) -> io::Result<()> {
    let cors = cors_layer(&config.app_url).map_err(|error| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("APP_URL is not a valid origin: {error}"),
        )
    })?;
    let state =
        AppState::new(build_workspaces(&config)).with_secure_cookies(config.secure_cookies());
    let app = build_router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(
        port = config.port,
        model = %config.model_id,
        "GameForge Studio listening on http://localhost:{}",
        config.port
    );

    axum::serve(listener, app).await
}
