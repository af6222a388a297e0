//! `codesmith serve` — Start the HTTP session server.

use codesmith_config::AppConfig;

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port_override {
        config.server.port = port;
    }

    println!("Codesmith session server");
    println!("   Listening: {}:{}", config.server.host, config.server.port);
    println!("   Model:     {} via {}", config.model, config.provider);
    println!("   Persisted: {}", config.store.enabled);

    codesmith_gateway::start(config).await?;

    Ok(())
}
