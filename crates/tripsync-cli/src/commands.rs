//! Configuration subcommands.

use crate::cli::Cli;
use crate::config::{FileConfig, Settings};
use crate::error::{ClientError, ClientResult};

/// Prints the effective file configuration as TOML.
pub fn config_dump(config: &FileConfig) -> ClientResult<()> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to render config: {}", e)))?;
    print!("{}", rendered);
    Ok(())
}

/// Prints the default configuration file path.
pub fn config_path() -> ClientResult<()> {
    println!("{}", FileConfig::default_path().display());
    Ok(())
}

/// Checks that the merged configuration is complete enough to run.
pub fn config_validate(cli: &Cli, config: &FileConfig) -> ClientResult<()> {
    let settings = Settings::resolve(cli, config)?;
    if !settings.google_keyfile.exists() {
        return Err(ClientError::Config(format!(
            "google keyfile {} does not exist",
            settings.google_keyfile.display()
        )));
    }
    println!("configuration OK");
    Ok(())
}
