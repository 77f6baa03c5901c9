//! Layered configuration for mediadex.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults ([`Config::default()`]).
//! 2. A TOML, YAML or JSON file, chosen by extension. Either given explicitly
//!    or looked up at [`default_path()`], where it is optional.
//! 3. Environment variables prefixed with `MEDIADEX_`, nested keys separated
//!    by `__` (`MEDIADEX_REFRESH__INTERVAL_SECS=600`).
//!
//! ```toml
//! [refresh]
//! interval_secs = 3600
//! provider_timeout_secs = 30
//!
//! [kinds.manga]
//! strategy = "inverted"
//! merge = "fill_missing"
//!
//! [[providers]]
//! name = "scantrad"
//! kind = "manga"
//! path = "catalogs/scantrad.json"
//! search_fields = { title_english = 2.0 }
//! ```

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use mediadex_identity::Kind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "MEDIADEX_";
const ENV_SEPARATOR: &str = "__";
const CONFIG_FILE: &str = "config.toml";
const MIN_BOOST: f64 = 1.0;
const MAX_BOOST: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Enumerate providers and search an inverted index over titles and
    /// keyword fields.
    Inverted,
    /// Enumerate providers and fuzzy-match titles and aliases.
    Fuzzy,
    /// Search providers directly and cache the results for a short while.
    OnDemand,
}
impl Strategy {
    pub fn enumerates(&self) -> bool {
        !matches!(self, Strategy::OnDemand)
    }
}

/// How the display payload of a title listed by several providers is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Merge {
    /// The first configured provider supplies everything.
    #[default]
    FirstWins,
    /// As `first_wins`, with a missing description or thumbnail taken from
    /// later providers.
    FillMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindConfig {
    pub strategy: Strategy,
    #[serde(default)]
    pub merge: Merge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub interval_secs: u64,
    pub provider_timeout_secs: u64,
}
impl Default for RefreshConfig {
    fn default() -> Self {
        Self { interval_secs: 3600, provider_timeout_secs: 30 }
    }
}
impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnDemandConfig {
    pub ttl_secs: u64,
    pub capacity: usize,
}
impl Default for OnDemandConfig {
    fn default() -> Self {
        Self { ttl_secs: 300, capacity: 1000 }
    }
}
impl OnDemandConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// A JSON catalog file served as one provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub name: String,
    pub kind: Kind,
    pub path: PathBuf,
    /// Keyword field → boost (1.0 to 2.0).
    #[serde(default)]
    pub search_fields: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub refresh: RefreshConfig,
    pub on_demand: OnDemandConfig,
    pub kinds: BTreeMap<Kind, KindConfig>,
    /// In priority order: earlier providers win when titles are merged.
    pub providers: Vec<ProviderConfig>,
}
impl Default for Config {
    fn default() -> Self {
        let kinds = [
            (Kind::Manga, Strategy::Inverted),
            (Kind::Anime, Strategy::Inverted),
            (Kind::Webtoon, Strategy::OnDemand),
        ];
        Self {
            refresh: RefreshConfig::default(),
            on_demand: OnDemandConfig::default(),
            kinds: kinds
                .into_iter()
                .map(|(kind, strategy)| (kind, KindConfig { strategy, merge: Merge::default() }))
                .collect(),
            providers: Vec::new(),
        }
    }
}

impl Config {
    /// Load from defaults, the given (or default) file and the environment,
    /// then validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(path)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(
            providers = config.providers.len(),
            kinds = config.kinds.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    /// The merged, not yet extracted, configuration sources.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        match path {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
                }
                figment = merge_file(figment, path)?;
            },
            None => {
                if let Some(path) = default_path().filter(|path| path.is_file()) {
                    tracing::debug!(path = %path.display(), "Using default configuration file");
                    figment = merge_file(figment, &path)?;
                }
            },
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR)))
    }

    /// Check everything that deserialization alone can't.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| ErrorKind::Invalid(reason);
        if self.refresh.interval_secs == 0 {
            exn::bail!(invalid("refresh.interval_secs must be positive".to_string()));
        }
        if self.refresh.provider_timeout_secs == 0 {
            exn::bail!(invalid("refresh.provider_timeout_secs must be positive".to_string()));
        }
        if self.on_demand.ttl_secs == 0 {
            exn::bail!(invalid("on_demand.ttl_secs must be positive".to_string()));
        }
        if self.on_demand.capacity == 0 {
            exn::bail!(invalid("on_demand.capacity must be positive".to_string()));
        }
        let mut names = HashSet::new();
        for provider in &self.providers {
            if provider.name.trim().is_empty() {
                exn::bail!(invalid("provider names must not be empty".to_string()));
            }
            if !names.insert(provider.name.as_str()) {
                exn::bail!(invalid(format!("provider {} is configured twice", provider.name)));
            }
            let Some(strategy) = self.strategy(provider.kind) else {
                exn::bail!(invalid(format!(
                    "provider {} serves {}, which has no strategy",
                    provider.name, provider.kind
                )));
            };
            if !provider.search_fields.is_empty() && strategy != Strategy::Inverted {
                exn::bail!(invalid(format!(
                    "provider {} declares search fields but {} is not searched with an inverted index",
                    provider.name, provider.kind
                )));
            }
            for (field, boost) in &provider.search_fields {
                if !(MIN_BOOST..=MAX_BOOST).contains(boost) {
                    exn::bail!(invalid(format!(
                        "search field {field} of {}: boost {boost} is not within 1-2",
                        provider.name
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn strategy(&self, kind: Kind) -> Option<Strategy> {
        self.kinds.get(&kind).map(|config| config.strategy)
    }

    /// Providers of one kind, in priority order.
    pub fn providers_for(&self, kind: Kind) -> impl Iterator<Item = &ProviderConfig> {
        self.providers.iter().filter(move |provider| provider.kind == kind)
    }
}

/// Where the configuration file is looked for when none is given.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mediadex").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|extension| extension.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}
