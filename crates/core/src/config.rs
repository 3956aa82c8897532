use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub places: PlacesConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub personalization: PersonalizationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PlacesConfig {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub radius_m: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CacheConfig {
    pub area_ttl_hours: u64,
    pub popularity_ttl_hours: u64,
    pub eviction_interval_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PersonalizationConfig {
    pub max_results: usize,
    pub top_recommendations: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub places_base_url: Option<String>,
    pub places_api_key: Option<String>,
    pub server_port: Option<u16>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://localscope.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            places: PlacesConfig {
                base_url: "https://maps.googleapis.com/maps/api/place".to_string(),
                api_key: None,
                radius_m: 3000,
                timeout_secs: 10,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                health_check_port: 8081,
                graceful_shutdown_secs: 15,
            },
            cache: CacheConfig {
                area_ttl_hours: 24,
                popularity_ttl_hours: 168,
                eviction_interval_secs: 3600,
            },
            personalization: PersonalizationConfig { max_results: 15, top_recommendations: 10 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    places: Option<PlacesPatch>,
    server: Option<ServerPatch>,
    cache: Option<CachePatch>,
    personalization: Option<PersonalizationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PlacesPatch {
    base_url: Option<String>,
    api_key: Option<String>,
    radius_m: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct CachePatch {
    area_ttl_hours: Option<u64>,
    popularity_ttl_hours: Option<u64>,
    eviction_interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PersonalizationPatch {
    max_results: Option<usize>,
    top_recommendations: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("localscope.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(places) = patch.places {
            if let Some(base_url) = places.base_url {
                self.places.base_url = base_url;
            }
            if let Some(api_key_value) = places.api_key {
                self.places.api_key = Some(secret_value(api_key_value));
            }
            if let Some(radius_m) = places.radius_m {
                self.places.radius_m = radius_m;
            }
            if let Some(timeout_secs) = places.timeout_secs {
                self.places.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(cache) = patch.cache {
            if let Some(area_ttl_hours) = cache.area_ttl_hours {
                self.cache.area_ttl_hours = area_ttl_hours;
            }
            if let Some(popularity_ttl_hours) = cache.popularity_ttl_hours {
                self.cache.popularity_ttl_hours = popularity_ttl_hours;
            }
            if let Some(eviction_interval_secs) = cache.eviction_interval_secs {
                self.cache.eviction_interval_secs = eviction_interval_secs;
            }
        }

        if let Some(personalization) = patch.personalization {
            if let Some(max_results) = personalization.max_results {
                self.personalization.max_results = max_results;
            }
            if let Some(top_recommendations) = personalization.top_recommendations {
                self.personalization.top_recommendations = top_recommendations;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("LOCALSCOPE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("LOCALSCOPE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("LOCALSCOPE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("LOCALSCOPE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("LOCALSCOPE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("LOCALSCOPE_PLACES_BASE_URL") {
            self.places.base_url = value;
        }
        if let Some(value) = read_env("LOCALSCOPE_PLACES_API_KEY") {
            self.places.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("LOCALSCOPE_PLACES_RADIUS_M") {
            self.places.radius_m = parse_u32("LOCALSCOPE_PLACES_RADIUS_M", &value)?;
        }
        if let Some(value) = read_env("LOCALSCOPE_PLACES_TIMEOUT_SECS") {
            self.places.timeout_secs = parse_u64("LOCALSCOPE_PLACES_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("LOCALSCOPE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("LOCALSCOPE_SERVER_PORT") {
            self.server.port = parse_u16("LOCALSCOPE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("LOCALSCOPE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("LOCALSCOPE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("LOCALSCOPE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("LOCALSCOPE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("LOCALSCOPE_CACHE_AREA_TTL_HOURS") {
            self.cache.area_ttl_hours = parse_u64("LOCALSCOPE_CACHE_AREA_TTL_HOURS", &value)?;
        }
        if let Some(value) = read_env("LOCALSCOPE_CACHE_POPULARITY_TTL_HOURS") {
            self.cache.popularity_ttl_hours =
                parse_u64("LOCALSCOPE_CACHE_POPULARITY_TTL_HOURS", &value)?;
        }
        if let Some(value) = read_env("LOCALSCOPE_CACHE_EVICTION_INTERVAL_SECS") {
            self.cache.eviction_interval_secs =
                parse_u64("LOCALSCOPE_CACHE_EVICTION_INTERVAL_SECS", &value)?;
        }

        let log_level =
            read_env("LOCALSCOPE_LOGGING_LEVEL").or_else(|| read_env("LOCALSCOPE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("LOCALSCOPE_LOGGING_FORMAT").or_else(|| read_env("LOCALSCOPE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(base_url) = overrides.places_base_url {
            self.places.base_url = base_url;
        }
        if let Some(api_key) = overrides.places_api_key {
            self.places.api_key = Some(secret_value(api_key));
        }
        if let Some(port) = overrides.server_port {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_places(&self.places)?;
        validate_server(&self.server)?;
        validate_cache(&self.cache)?;
        validate_personalization(&self.personalization)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("localscope.toml"), PathBuf::from("config/localscope.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_places(places: &PlacesConfig) -> Result<(), ConfigError> {
    if places.base_url.trim().is_empty() {
        return Err(ConfigError::Validation("places.base_url must not be empty".to_string()));
    }

    if let Some(api_key) = &places.api_key {
        if api_key.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation(
                "places.api_key must not be empty when set".to_string(),
            ));
        }
    }

    if !(crate::domain::geo::MIN_RADIUS_M..=crate::domain::geo::MAX_RADIUS_M)
        .contains(&places.radius_m)
    {
        return Err(ConfigError::Validation(
            "places.radius_m must be in range 1..=50000".to_string(),
        ));
    }

    if places.timeout_secs == 0 || places.timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "places.timeout_secs must be in range 1..=60".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == server.health_check_port {
        return Err(ConfigError::Validation(
            "server.port and server.health_check_port must differ".to_string(),
        ));
    }

    Ok(())
}

fn validate_cache(cache: &CacheConfig) -> Result<(), ConfigError> {
    if cache.area_ttl_hours == 0 {
        return Err(ConfigError::Validation(
            "cache.area_ttl_hours must be greater than zero".to_string(),
        ));
    }
    if cache.popularity_ttl_hours == 0 {
        return Err(ConfigError::Validation(
            "cache.popularity_ttl_hours must be greater than zero".to_string(),
        ));
    }
    if cache.eviction_interval_secs < 60 {
        return Err(ConfigError::Validation(
            "cache.eviction_interval_secs must be at least 60".to_string(),
        ));
    }
    Ok(())
}

fn validate_personalization(personalization: &PersonalizationConfig) -> Result<(), ConfigError> {
    if personalization.max_results == 0 || personalization.top_recommendations == 0 {
        return Err(ConfigError::Validation(
            "personalization caps must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
    let level = logging.level.trim().to_ascii_lowercase();
    if !LEVELS.contains(&level.as_str()) {
        return Err(ConfigError::Validation(format!(
            "logging.level must be one of trace|debug|info|warn|error, got `{}`",
            logging.level
        )));
    }
    Ok(())
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn defaults_pass_validation() {
        AppConfig::default().validate().expect("default config should validate");
    }

    #[test]
    fn patch_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            "[cache]\narea_ttl_hours = 6\n\n[personalization]\nmax_results = 20\n\n[logging]\nformat = \"json\""
        )
        .expect("write config");

        let config = AppConfig::load(LoadOptions {
            config_path: Some(file.path().to_path_buf()),
            require_file: true,
            overrides: ConfigOverrides::default(),
        })
        .expect("load config");

        assert_eq!(config.cache.area_ttl_hours, 6);
        assert_eq!(config.personalization.max_results, 20);
        assert_eq!(config.logging.format, LogFormat::Json);
        // untouched sections keep their defaults
        assert_eq!(config.places.radius_m, 3000);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/definitely/not/here.toml")),
            require_file: true,
            overrides: ConfigOverrides::default(),
        });
        assert!(matches!(result, Err(ConfigError::MissingConfigFile(_))));
    }

    #[test]
    fn explicit_overrides_win() {
        let config = AppConfig::load(LoadOptions {
            overrides: ConfigOverrides {
                database_url: Some("sqlite::memory:".to_string()),
                server_port: Some(9999),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .expect("load config");

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(config.server.port, 9999);
    }

    #[test]
    fn validation_rejects_zero_ttl() {
        let mut config = AppConfig::default();
        config.cache.area_ttl_hours = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validation_rejects_non_sqlite_database_url() {
        let mut config = AppConfig::default();
        config.database.url = "postgres://localhost/app".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validation_rejects_colliding_ports() {
        let mut config = AppConfig::default();
        config.server.health_check_port = config.server.port;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn interpolation_reports_unterminated_expression() {
        let result = interpolate_env_vars("key = \"${UNCLOSED");
        assert!(matches!(result, Err(ConfigError::UnterminatedInterpolation)));
    }

    #[test]
    fn log_format_parses_known_values_only() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
