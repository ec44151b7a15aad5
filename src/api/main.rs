use anyhow::Result;

#[path = "../agent/mod.rs"]
mod agent;
#[path = "../api/mod.rs"]
mod api;
#[path = "../sandbox/mod.rs"]
mod sandbox;
#[path = "../shared/mod.rs"]
mod shared;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize service logging
    let _ = shared::logging::init_service_logging("/app/logs", "crucible_api");

    // Run the API server
    api::rest::api::run_rest_server().await
}
