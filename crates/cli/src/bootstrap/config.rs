use dnsward_domain::Config;

/// Loads and validates the configuration file. Logging isn't initialized
/// yet at this point in startup (it depends on `config.log_level`), so this
/// stays silent; the caller logs a summary once `init_logging` has run.
pub fn load_config(path: &str) -> anyhow::Result<Config> {
    Ok(Config::load(path)?)
}
