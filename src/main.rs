use mesa::application::ConversationEngine;
use mesa::config::Config;
use mesa::domain::extraction::RuleSlotReader;
use mesa::domain::lexicon::Lexicon;
use mesa::domain::reservation::ReservationStore;
use mesa::domain::strategy::{with_fallback, TableReplyWriter, TextGenerator};
use mesa::infrastructure::llm::{GeminiClient, LlmReplyWriter, LlmSlotReader};
use mesa::infrastructure::persistence::InMemoryReservationStore;
use mesa::infrastructure::session::InMemorySessionStore;
use mesa::interface::api::{build_router, init_metrics, AppState};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "postgres")]
use mesa::infrastructure::persistence::{create_pool, mask_password, run_migrations, DatabaseConfig, PgReservationStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mesa=debug,tower_http=debug")),
        )
        .init();

    info!("Starting Mesa reservation assistant");

    // Load configuration
    let config = Config::load()?;
    info!(
        "Configuration loaded: server {}, capabilities {:?}",
        config.bind_address(),
        config.dialogue.capabilities
    );

    let lexicon = Arc::new(Lexicon::load(
        config.lexicon.dir.as_deref(),
        config.lexicon.default_language,
    )?);
    info!("Lexicon loaded, default language {}", lexicon.default_language());

    let reservations = reservation_store(&config).await?;
    let sessions = Arc::new(InMemorySessionStore::new());

    let mut engine = ConversationEngine::new(lexicon.clone(), sessions, reservations)
        .with_capabilities(config.dialogue.capabilities)
        .with_persist_timeout(config.dialogue.persist_timeout());

    if config.dialogue.capabilities.generative {
        match config.llm.api_key() {
            Some(api_key) => {
                let mut client = GeminiClient::new(api_key, config.llm.model.clone(), config.llm.timeout())?;
                if let Some(base_url) = &config.llm.base_url {
                    client = client.with_base_url(base_url.clone());
                }
                info!("Generative model enabled: {}", client.model());
                let generator: Arc<dyn TextGenerator> = Arc::new(client);

                engine = engine
                    .with_slot_reader(Arc::new(
                        with_fallback(LlmSlotReader::new(generator.clone()), RuleSlotReader::new(lexicon.clone()))
                            .timeout(config.llm.timeout())
                            .stage("slot_reader"),
                    ))
                    .with_reply_writer(Arc::new(
                        with_fallback(LlmReplyWriter::new(generator), TableReplyWriter)
                            .timeout(config.llm.timeout())
                            .stage("reply_writer"),
                    ));
            }
            None => warn!("Generative capability enabled but no API key configured, using rules only"),
        }
    }

    // Initialize metrics exporter
    info!("Initializing Prometheus metrics exporter");
    let prometheus_handle = init_metrics()?;

    let state = AppState::new(Arc::new(engine))
        .with_telephony(&config.telephony)
        .with_cleanup_delay(config.dialogue.session_cleanup());
    state.spawn_idle_sweeper(
        config.dialogue.session_sweep_interval(),
        config.dialogue.session_idle_ttl(),
    );
    let app = build_router(state, prometheus_handle);

    let listener = tokio::net::TcpListener::bind(config.bind_address()).await?;
    info!("HTTP server listening on {}", config.bind_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down...");
        })
        .await?;

    info!("Mesa stopped");
    Ok(())
}

#[cfg(feature = "postgres")]
async fn reservation_store(config: &Config) -> anyhow::Result<Arc<dyn ReservationStore>> {
    if config.database.url.trim().is_empty() {
        warn!("No database URL configured, reservations are kept in memory");
        return Ok(Arc::new(InMemoryReservationStore::new()));
    }

    let db_config = DatabaseConfig::from(&config.database);
    info!("Connecting to database {}", mask_password(&db_config.url));
    let pool = create_pool(&db_config).await?;
    info!("Database connection pool created");

    info!("Running database migrations...");
    run_migrations(&pool).await?;
    info!("Database migrations completed");

    Ok(Arc::new(PgReservationStore::new(pool)))
}

#[cfg(not(feature = "postgres"))]
async fn reservation_store(_config: &Config) -> anyhow::Result<Arc<dyn ReservationStore>> {
    info!("Built without Postgres support, reservations are kept in memory");
    Ok(Arc::new(InMemoryReservationStore::new()))
}
