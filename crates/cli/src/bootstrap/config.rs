use anyhow::Context;
use conditional_dns_domain::{CliOverrides, Config};

/// Load the config file, apply CLI overrides and validate the result.
pub fn load_config(path: Option<&str>, overrides: CliOverrides) -> anyhow::Result<Config> {
    let config = Config::load(path, overrides).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
