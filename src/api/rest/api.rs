use anyhow::Result;
use std::fs;
use std::process;
use std::sync::Arc;
use tracing::info;

use crate::api::rest::create_router;
use crate::shared::{AppState, Settings};

pub async fn run_rest_server() -> Result<()> {
    // Write PID file for process management
    let pid = process::id();
    let pid_file = "/tmp/crucible.pid";

    if let Err(e) = fs::write(pid_file, pid.to_string()) {
        tracing::warn!("Could not write PID file: {}", e);
    }

    // Set up cleanup on exit
    let pid_file_cleanup = pid_file.to_string();
    ctrlc::set_handler(move || {
        info!("Shutting down Crucible API...");
        let _ = fs::remove_file(&pid_file_cleanup);
        std::process::exit(0);
    })?;

    info!("Starting Crucible REST API service... PID: {}", pid);

    let settings = Settings::from_env()?;
    let bind_addr = format!("{}:{}", settings.host, settings.port);

    let app_state = Arc::new(AppState::build(settings)?);

    info!("Building REST API routes...");
    let app = create_router(app_state);

    info!("Binding to: {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("API started successfully!");
    info!("REST API Endpoint: http://{}/api/v1", bind_addr);

    let rest_server_result = axum::serve(listener, app).await;

    // Clean up PID file on exit
    let _ = fs::remove_file(pid_file);

    rest_server_result?;
    Ok(())
}
