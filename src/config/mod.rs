//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;
#[cfg(test)]
mod tests;

use std::str::FromStr;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::CacheConfig;
use crate::infra::catalog::LatencyProfile;

pub use cli::{ByCategoryArgs, CliArgs, Command, GlobalOverrides, ListArgs, SearchArgs, ShowArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "vitrina";
const ENV_PREFIX: &str = "VITRINA";

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache: CacheConfig,
    pub catalog: CatalogSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            format: LogFormat::Compact,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogSettings {
    pub latency: LatencyProfile,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SearchSettings {
    pub accent_insensitive: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
    catalog: RawCatalogSettings,
    search: RawSearchSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(simulate) = overrides.simulate_latency {
            self.catalog.simulate_latency = Some(simulate);
        }
        if let Some(accent_insensitive) = overrides.accent_insensitive {
            self.search.accent_insensitive = Some(accent_insensitive);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            logging,
            cache,
            catalog,
            search,
        } = raw;

        let logging = build_logging_settings(logging)?;
        let cache = build_cache_settings(cache)?;
        let catalog = build_catalog_settings(catalog);
        let search = SearchSettings {
            accent_insensitive: search.accent_insensitive.unwrap_or(false),
        };

        Ok(Self {
            logging,
            cache,
            catalog,
            search,
        })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheConfig, LoadError> {
    let defaults = CacheConfig::default();

    let list_limit = non_zero(cache.list_limit, defaults.list_limit, "cache.list_limit")?;
    let detail_limit = non_zero(cache.detail_limit, defaults.detail_limit, "cache.detail_limit")?;
    let search_limit = non_zero(cache.search_limit, defaults.search_limit, "cache.search_limit")?;
    let consume_batch_limit = non_zero(
        cache.consume_batch_limit,
        defaults.consume_batch_limit,
        "cache.consume_batch_limit",
    )?;

    Ok(CacheConfig {
        enabled: cache.enabled.unwrap_or(defaults.enabled),
        list_stale_secs: cache.list_stale_secs.unwrap_or(defaults.list_stale_secs),
        detail_stale_secs: cache.detail_stale_secs.unwrap_or(defaults.detail_stale_secs),
        categories_stale_secs: cache
            .categories_stale_secs
            .unwrap_or(defaults.categories_stale_secs),
        search_stale_secs: cache.search_stale_secs.unwrap_or(defaults.search_stale_secs),
        by_category_stale_secs: cache
            .by_category_stale_secs
            .unwrap_or(defaults.by_category_stale_secs),
        list_limit,
        detail_limit,
        search_limit,
        min_search_len: cache.min_search_len.unwrap_or(defaults.min_search_len),
        consume_batch_limit,
    })
}

fn build_catalog_settings(catalog: RawCatalogSettings) -> CatalogSettings {
    if !catalog.simulate_latency.unwrap_or(true) {
        return CatalogSettings {
            latency: LatencyProfile::instant(),
        };
    }

    let defaults = LatencyProfile::default();
    CatalogSettings {
        latency: LatencyProfile {
            list_ms: catalog.list_ms.unwrap_or(defaults.list_ms),
            get_ms: catalog.get_ms.unwrap_or(defaults.get_ms),
            create_ms: catalog.create_ms.unwrap_or(defaults.create_ms),
            update_ms: catalog.update_ms.unwrap_or(defaults.update_ms),
            delete_ms: catalog.delete_ms.unwrap_or(defaults.delete_ms),
            categories_ms: catalog.categories_ms.unwrap_or(defaults.categories_ms),
            search_ms: catalog.search_ms.unwrap_or(defaults.search_ms),
            by_category_ms: catalog.by_category_ms.unwrap_or(defaults.by_category_ms),
        },
    }
}

fn non_zero(value: Option<usize>, default: usize, key: &'static str) -> Result<usize, LoadError> {
    match value {
        Some(0) => Err(LoadError::invalid(key, "must be greater than zero")),
        Some(value) => Ok(value),
        None => Ok(default),
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    list_stale_secs: Option<u64>,
    detail_stale_secs: Option<u64>,
    categories_stale_secs: Option<u64>,
    search_stale_secs: Option<u64>,
    by_category_stale_secs: Option<u64>,
    list_limit: Option<usize>,
    detail_limit: Option<usize>,
    search_limit: Option<usize>,
    min_search_len: Option<usize>,
    consume_batch_limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCatalogSettings {
    simulate_latency: Option<bool>,
    list_ms: Option<u64>,
    get_ms: Option<u64>,
    create_ms: Option<u64>,
    update_ms: Option<u64>,
    delete_ms: Option<u64>,
    categories_ms: Option<u64>,
    search_ms: Option<u64>,
    by_category_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSearchSettings {
    accent_insensitive: Option<bool>,
}
