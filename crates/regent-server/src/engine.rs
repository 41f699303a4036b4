//! Policy engine initialization
//!
//! Converts the server configuration into an SDK engine configuration and
//! builds the engine. Any load, bind or build failure aborts startup.

use crate::config::ServerConfig;
use anyhow::Result;
use regent_sdk::{PolicyEngine, PolicyEngineBuilder};
use tracing::info;

/// Initialize the policy engine
pub async fn init_engine(config: &ServerConfig) -> Result<PolicyEngine> {
    info!(
        "Building policy engine from {:?} with {} binding",
        config.bundle.base_path, config.strategy
    );

    let engine = PolicyEngineBuilder::new()
        .with_config(config.engine_config())
        .build()
        .await?;

    Ok(engine)
}
