//! OddsPress - multilingual sports-odds blog

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oddspress::{
    api::{self, AppState, RequestStats},
    auth::SessionResolver,
    cache::create_cache,
    config::Config,
    content::ContentStore,
    services::{blog::BlogService, markdown::MarkdownRenderer},
    theme::ThemeEngine,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oddspress=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting OddsPress v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    let store = Arc::new(ContentStore::load(config.content.path.as_deref())?);
    tracing::info!(
        "Content loaded: {} posts in {} categories",
        store.posts().len(),
        store.categories().len()
    );

    let cache = create_cache(&config.cache);
    tracing::info!("Cache initialized");

    let blog_service = Arc::new(BlogService::new(
        store,
        MarkdownRenderer::new(),
        cache.clone(),
        config.site.related_limit,
    ));

    let theme_engine = ThemeEngine::new(config.theme.path.as_deref())?;
    tracing::info!("Theme engine initialized: {:?}", theme_engine.source());

    let sessions = SessionResolver::from_config(&config.auth, cache)?;
    if !config.auth.is_enabled() {
        tracing::info!("Supabase auth not configured, all visitors are anonymous");
    }

    let state = AppState {
        site: Arc::new(config.site.clone()),
        auth: Arc::new(config.auth.clone()),
        blog_service,
        theme_engine: Arc::new(theme_engine),
        sessions: Arc::new(sessions),
        request_stats: Arc::new(RequestStats::new()),
    };

    let app = api::build_router(state, &config.server.cors_origin);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
