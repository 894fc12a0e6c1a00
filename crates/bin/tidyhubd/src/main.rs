//! # tidyhubd: tidyhub daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialise logging
//! - Build the virtual home and the engine on top of its ports
//! - Run the engine loop next to the axum server
//! - Handle graceful shutdown (SIGINT): stop serving, then stop the engine
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::sync::Arc;

use tidyhub_adapter_http_axum::state::AppState;
use tidyhub_adapter_virtual::VirtualHome;
use tidyhub_app::engine::{Engine, EnginePorts};
use tidyhub_app::event_bus::InProcessEventBus;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_filter()))
        .init();

    // Home
    let bus = InProcessEventBus::new(256);
    let home = Arc::new(VirtualHome::from_spec(&config.home(), bus.clone())?);

    // Engine
    let changes = bus.subscribe();
    let engine = Arc::new(Engine::new(
        EnginePorts {
            store: Arc::clone(&home),
            locations: Arc::clone(&home),
            devices: Arc::clone(&home),
            invoker: Arc::clone(&home),
        },
        home.as_ref(),
        config.settings(),
        config.rooms.clone(),
    )?);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let engine_task = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move {
            engine
                .run(changes, async {
                    stop_rx.await.ok();
                })
                .await;
        }
    });

    // HTTP
    let app = tidyhub_adapter_http_axum::router::build(AppState::new(engine));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, rooms = config.rooms.len(), "tidyhubd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    stop_tx.send(()).ok();
    engine_task.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for ctrl-c, serving until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
