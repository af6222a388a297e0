//! `codesmith init` — Write the default configuration scaffold.

use codesmith_config::AppConfig;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let dir = AppConfig::config_dir();
    let path = dir.join("config.toml");

    if path.exists() {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    std::fs::create_dir_all(&dir)?;
    std::fs::write(&path, AppConfig::default_toml())?;

    println!("Wrote {}", path.display());
    println!("Set your API key there or export CODESMITH_API_KEY.");
    Ok(())
}
