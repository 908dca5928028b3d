use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "BOOKSHELF_ENV";
const CONFIG_DIR_ENV: &str = "BOOKSHELF_CONFIG_DIR";
const ENV_PREFIX: &str = "BOOKSHELF";

/// Plain variables honoured on top of the layered configuration.
const PORT_ENV: &str = "PORT";
const DATABASE_URI_ENVS: &[&str] = &["MONGO_URI", "url"];

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay,
    /// prefixed variables, and finally `PORT` / `MONGO_URI` / `url`.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        Self::load_from_vars(std::env::vars().collect())
    }

    /// Same layering as [`Settings::load`], reading variables from `vars`
    /// instead of the process environment.
    pub fn load_from_vars(vars: config::Map<String, String>) -> anyhow::Result<Self> {
        let environment = vars
            .get(ENV_VAR_NAME)
            .cloned()
            .unwrap_or_else(|| DEFAULT_ENV.to_string());
        let config_dir = match vars.get(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => std::env::current_dir()
                .map(|cwd| cwd.join("config"))
                .with_context(|| "unable to resolve current directory")?,
        };

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(vars.clone())),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = match environment.as_str() {
            "local" => Environment::Local,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                return Err(anyhow!(
                    "unsupported environment '{}'; expected local/staging/production",
                    other
                ));
            }
        };

        settings.apply_plain_env(|key| vars.get(key).cloned())?;

        Ok(settings)
    }

    /// Apply `PORT` and the first non-empty of `MONGO_URI` / `url`.
    pub fn apply_plain_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<()> {
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(port) = present(PORT_ENV) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid {} value '{}'", PORT_ENV, port))?;
        }

        if let Some(uri) = DATABASE_URI_ENVS.iter().find_map(|key| present(*key)) {
            self.database.uri = Some(uri);
        }

        Ok(())
    }

    /// The record store URI; its absence is a startup failure.
    pub fn database_uri(&self) -> anyhow::Result<&str> {
        self.database
            .uri
            .as_deref()
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "no record store URI configured; set {} or {}",
                    DATABASE_URI_ENVS[0],
                    DATABASE_URI_ENVS[1]
                )
            })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    /// Unset means requests are never timed out by the server.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        3000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub uri: Option<String>,
    /// Used when the URI does not name a database.
    #[serde(default = "DatabaseSettings::default_name")]
    pub name: String,
}

impl DatabaseSettings {
    fn default_name() -> String {
        "test".to_string()
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            uri: None,
            name: Self::default_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// Filter directives; `RUST_LOG` takes precedence when set.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_port_is_3000() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.server.request_timeout_ms, None);
    }

    #[test]
    fn missing_uri_is_an_error() {
        let settings = Settings::default();
        assert!(settings.database_uri().is_err());
    }

    #[test]
    fn mongo_uri_wins_over_url() {
        let mut settings = Settings::default();
        settings
            .apply_plain_env(lookup(&[
                ("MONGO_URI", "mongodb://primary/books"),
                ("url", "mongodb://secondary/books"),
            ]))
            .unwrap();

        assert_eq!(settings.database_uri().unwrap(), "mongodb://primary/books");
    }

    #[test]
    fn url_is_used_when_mongo_uri_is_empty() {
        let mut settings = Settings::default();
        settings
            .apply_plain_env(lookup(&[("MONGO_URI", ""), ("url", "mongodb://fallback")]))
            .unwrap();

        assert_eq!(settings.database_uri().unwrap(), "mongodb://fallback");
    }

    #[test]
    fn port_variable_overrides_default() {
        let mut settings = Settings::default();
        settings.apply_plain_env(lookup(&[("PORT", "8081")])).unwrap();
        assert_eq!(settings.server.port, 8081);
    }

    fn config_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("base.toml"),
            "[server]\nport = 4000\nhost = \"127.0.0.1\"\n\n[database]\nname = \"shelf\"\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("staging.toml"),
            "[server]\nport = 5000\n\n[telemetry]\nlog_format = \"json\"\n",
        )
        .unwrap();
        dir
    }

    fn vars(dir: &tempfile::TempDir, extra: &[(&str, &str)]) -> config::Map<String, String> {
        let mut vars = config::Map::new();
        vars.insert(
            "BOOKSHELF_CONFIG_DIR".to_string(),
            dir.path().display().to_string(),
        );
        for (key, value) in extra {
            vars.insert(key.to_string(), value.to_string());
        }
        vars
    }

    #[test]
    fn base_file_sets_values() {
        let dir = config_dir();
        let settings = Settings::load_from_vars(vars(&dir, &[])).unwrap();

        assert_eq!(settings.environment, Environment::Local);
        assert_eq!(settings.server.port, 4000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.database.name, "shelf");
        assert_eq!(settings.telemetry.log_format, LogFormat::Pretty);
    }

    #[test]
    fn environment_file_overrides_base() {
        let dir = config_dir();
        let settings =
            Settings::load_from_vars(vars(&dir, &[("BOOKSHELF_ENV", "staging")])).unwrap();

        assert_eq!(settings.environment, Environment::Staging);
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.database.name, "shelf");
        assert_eq!(settings.telemetry.log_format, LogFormat::Json);
    }

    #[test]
    fn prefixed_variables_override_files() {
        let dir = config_dir();
        let settings = Settings::load_from_vars(vars(
            &dir,
            &[
                ("BOOKSHELF_ENV", "staging"),
                ("BOOKSHELF_SERVER__PORT", "6000"),
                ("BOOKSHELF_DATABASE__NAME", "library"),
            ],
        ))
        .unwrap();

        assert_eq!(settings.server.port, 6000);
        assert_eq!(settings.database.name, "library");
    }

    #[test]
    fn plain_port_overrides_prefixed_variable() {
        let dir = config_dir();
        let settings = Settings::load_from_vars(vars(
            &dir,
            &[
                ("BOOKSHELF_ENV", "staging"),
                ("BOOKSHELF_SERVER__PORT", "6000"),
                ("PORT", "7000"),
                ("url", "mongodb://fallback/books"),
            ],
        ))
        .unwrap();

        assert_eq!(settings.server.port, 7000);
        assert_eq!(settings.database_uri().unwrap(), "mongodb://fallback/books");
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let dir = config_dir();
        let err = Settings::load_from_vars(vars(&dir, &[("BOOKSHELF_ENV", "qa")])).unwrap_err();
        assert!(err.to_string().contains("unsupported environment 'qa'"));
    }

    #[test]
    fn invalid_port_is_rejected() {
        let mut settings = Settings::default();
        let err = settings
            .apply_plain_env(lookup(&[("PORT", "eighty")]))
            .unwrap_err();
        assert!(err.to_string().contains("invalid PORT"));
    }
}
