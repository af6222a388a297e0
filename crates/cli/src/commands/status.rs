//! `codesmith status` — Show configuration and provider state.

use codesmith_config::AppConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    println!("Codesmith status");
    println!(
        "   Config:    {} ({})",
        config_path.display(),
        if config_path.exists() {
            "present"
        } else {
            "defaults"
        }
    );
    println!("   Provider:  {} ({})", config.provider, config.base_url);
    println!("   Model:     {}", config.model);
    println!(
        "   API key:   {}",
        if config.has_api_key() {
            "configured"
        } else {
            "missing"
        }
    );
    println!(
        "   Server:    {}:{}",
        config.server.host, config.server.port
    );
    println!(
        "   Store:     {}",
        if config.store.enabled {
            config.store_path().display().to_string()
        } else {
            "disabled".to_string()
        }
    );
    println!("   Steps:     {} max per session", config.agent.max_steps);

    Ok(())
}
