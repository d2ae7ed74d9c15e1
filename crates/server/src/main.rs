//! WhatsApp sales agent entry point

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use zap_agent_agent::{AgentEngine, SessionStore};
use zap_agent_config::{load_settings, Settings};
use zap_agent_llm::OpenAiBackend;
use zap_agent_server::{create_router, AppState, Dispatcher, LeadLog};
use zap_agent_whatsapp::WhatsAppClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("ZAP_AGENT_ENV").ok();
    let settings = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            // Tracing not yet initialized
            eprintln!("Failed to load config: {}", e);
            return Err(e.into());
        },
    };

    init_tracing(&settings);

    tracing::info!("Starting zap-agent v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?settings.environment,
        config_env = env.as_deref().unwrap_or("default"),
        model = %settings.llm.model,
        "Configuration loaded"
    );

    let settings = Arc::new(settings);

    let llm = Arc::new(OpenAiBackend::new(settings.llm.clone())?);
    let whatsapp = Arc::new(WhatsAppClient::new(settings.whatsapp.clone())?);
    let sessions = Arc::new(SessionStore::new());
    let leads = Arc::new(LeadLog::new(settings.lead_log_path.clone()));

    let engine = Arc::new(AgentEngine::new(
        Arc::new(settings.sales.clone()),
        llm.clone(),
    ));

    let dispatcher = Arc::new(Dispatcher::new(
        engine,
        llm,
        whatsapp,
        sessions.clone(),
        leads,
        settings.sales.typing_delay.clone(),
    ));

    let state = AppState::new(settings.clone(), sessions, dispatcher);
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

/// Initialize tracing from the observability config
fn init_tracing(settings: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.observability.log_level;
        format!("zap_agent={},tower_http=debug", level).into()
    });

    let fmt_layer = if settings.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
