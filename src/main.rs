//! CodeRush desk backend entrypoint wiring REST, SSE and both external stores.

use std::{env, net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::Router;
use coderush_desk_back::{
    config::AppConfig,
    dao::{
        realtime_store::{MemoryRealtimeStore, RealtimeStore},
        registration_store::{MemoryRegistrationStore, RegistrationStore},
    },
    routes,
    services::{storage_supervisor, timer_ticker},
    state::{AppState, SharedState, Stores},
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let stores = Stores {
        registrations: registration_store(),
        realtime: realtime_store(),
    };
    let app_state = AppState::new(config, stores);

    tokio::spawn(storage_supervisor::run(app_state.clone()));
    tokio::spawn(timer_ticker::run(app_state.clone()));

    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

#[cfg(feature = "sheet-store")]
fn registration_store() -> Arc<dyn RegistrationStore> {
    use coderush_desk_back::dao::registration_store::sheet::{SheetConfig, SheetRegistrationStore};

    match SheetConfig::from_env().and_then(SheetRegistrationStore::connect) {
        Ok(store) => {
            info!("using the registration sheet as system of record");
            Arc::new(store)
        }
        Err(err) => {
            warn!(error = %err, "registration sheet not configured; using the in-memory store");
            Arc::new(MemoryRegistrationStore::new())
        }
    }
}

#[cfg(not(feature = "sheet-store"))]
fn registration_store() -> Arc<dyn RegistrationStore> {
    info!("sheet-store feature disabled; using the in-memory registration store");
    Arc::new(MemoryRegistrationStore::new())
}

#[cfg(feature = "firebase-store")]
fn realtime_store() -> Arc<dyn RealtimeStore> {
    use coderush_desk_back::dao::realtime_store::firebase::{FirebaseConfig, FirebaseRealtimeStore};

    match FirebaseConfig::from_env().and_then(FirebaseRealtimeStore::connect) {
        Ok(store) => {
            info!("using the remote realtime database");
            Arc::new(store)
        }
        Err(err) => {
            warn!(error = %err, "realtime database not configured; using the in-memory store");
            Arc::new(MemoryRealtimeStore::new())
        }
    }
}

#[cfg(not(feature = "firebase-store"))]
fn realtime_store() -> Arc<dyn RealtimeStore> {
    info!("firebase-store feature disabled; using the in-memory realtime store");
    Arc::new(MemoryRealtimeStore::new())
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "cannot listen for SIGTERM; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
