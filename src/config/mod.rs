use std::path::PathBuf;

use figment::providers::Format;
use figment::Figment;
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct AppCfg {
    pub database_url: String,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_media_root")]
    pub media_root: PathBuf,
    /// Seconds the rendered index page stays cached.
    #[serde(default = "default_index_cache_secs")]
    pub index_cache_secs: u64,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".into()
}

fn default_media_root() -> PathBuf {
    "./media".into()
}

fn default_index_cache_secs() -> u64 {
    20
}

fn default_session_ttl_hours() -> i64 {
    14 * 24
}

/// `appsettings.json` overridden by `APP_`-prefixed environment variables.
pub fn load() -> Result<AppCfg, figment::Error> {
    Figment::new()
        .merge(figment::providers::Json::file("appsettings.json"))
        .merge(figment::providers::Env::prefixed("APP_"))
        .extract()
}
