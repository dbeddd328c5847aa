//! Layered configuration for gallery.
//!
//! Sources, lowest priority first:
//!
//! 1. built-in defaults,
//! 2. a TOML file (the path given on the command line, otherwise
//!    `gallery.toml` in the platform config directory if it exists),
//! 3. `GALLERY_*` environment variables, nested with `__`
//!    (e.g. `GALLERY_POLL__INTERVAL_SECS=10`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "GALLERY_";
pub const CONFIG_FILE_NAME: &str = "gallery.toml";
/// Upper bound for `poll.max_interval_secs`: one week.
pub const MAX_POLL_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub poll: PollConfig,
    pub cache: CacheConfig,
    pub thumbnail: ThumbnailConfig,
}

/// Where photos are listed and downloaded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Absolute directory every path is resolved against. Required.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    /// Folder, relative to `root`, whose direct children are the photos.
    pub folder: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { root: None, folder: PathBuf::from(".") }
    }
}

/// Scheduling of background synchronization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
    /// Upper bound for the interval while backing off after failures.
    pub max_interval_secs: u64,
    /// Random spread applied to every wait, as a fraction of it.
    pub jitter: f64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 30, max_interval_secs: 30 * 60, jitter: 0.1 }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_secs(self.max_interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Deadline for any single fetch; `0` disables it.
    pub fetch_timeout_secs: u64,
    /// How many items are enriched at once during a synchronization.
    pub enrich_concurrency: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { fetch_timeout_secs: 60, enrich_concurrency: 16 }
    }
}

impl CacheConfig {
    pub fn fetch_timeout(&self) -> Option<Duration> {
        (self.fetch_timeout_secs > 0).then(|| Duration::from_secs(self.fetch_timeout_secs))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Width used when none is requested.
    pub default_size: u32,
    /// Requested dimensions are clamped to this.
    pub max_size: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self { default_size: 200, max_size: 1000 }
    }
}

impl Config {
    /// Load and validate configuration.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_path(),
        };
        tracing::debug!(file = ?file, "Loading configuration");
        Self::from_figment(Self::figment(file.as_deref()))
    }

    /// The provider stack used by [`Config::load`], exposed so callers can
    /// merge in their own overrides.
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and relationships that serde can't express.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Err(exn::Exn::from(ErrorKind::Invalid(message.to_string())));
        match &self.source.root {
            None => return invalid("source.root is required"),
            Some(root) if !root.is_absolute() => return invalid("source.root must be an absolute path"),
            Some(_) => {},
        }
        if self.source.folder.is_absolute() {
            return invalid("source.folder must be relative to source.root");
        }
        if self.poll.interval_secs == 0 {
            return invalid("poll.interval_secs must be greater than zero");
        }
        if self.poll.max_interval_secs < self.poll.interval_secs {
            return invalid("poll.max_interval_secs must not be less than poll.interval_secs");
        }
        if self.poll.max_interval_secs > MAX_POLL_INTERVAL_SECS {
            return invalid("poll.max_interval_secs must not exceed one week");
        }
        if !(0.0..1.0).contains(&self.poll.jitter) {
            return invalid("poll.jitter must be in [0, 1)");
        }
        if self.cache.enrich_concurrency == 0 {
            return invalid("cache.enrich_concurrency must be greater than zero");
        }
        if self.thumbnail.default_size == 0 || self.thumbnail.max_size == 0 {
            return invalid("thumbnail sizes must be greater than zero");
        }
        if self.thumbnail.default_size > self.thumbnail.max_size {
            return invalid("thumbnail.default_size must not exceed thumbnail.max_size");
        }
        Ok(())
    }
}

/// `gallery.toml` in the platform config directory, if there is one.
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "gallery")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
        .filter(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use rstest::rstest;

    fn valid() -> Config {
        Config {
            source: SourceConfig { root: Some(PathBuf::from("/srv/photos")), ..Default::default() },
            ..Default::default()
        }
    }

    #[test]
    fn defaults_need_a_root() {
        let err = Config::default().validate().unwrap_err();
        assert_eq!(*err, ErrorKind::Invalid("source.root is required".to_string()));
        valid().validate().unwrap();
    }

    #[test]
    fn load_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE_NAME,
                r#"
                    [source]
                    root = "/srv/photos"
                    folder = "holiday"

                    [poll]
                    interval_secs = 5
                "#,
            )?;
            let config = Config::load(Some(Path::new(CONFIG_FILE_NAME))).unwrap();
            assert_eq!(config.source.root, Some(PathBuf::from("/srv/photos")));
            assert_eq!(config.source.folder, PathBuf::from("holiday"));
            assert_eq!(config.poll.interval(), Duration::from_secs(5));
            // Untouched values keep their defaults.
            assert_eq!(config.poll.max_interval_secs, 1800);
            assert_eq!(config.thumbnail, ThumbnailConfig::default());
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE_NAME, "[source]\nroot = \"/srv/photos\"\n[cache]\nenrich_concurrency = 4\n")?;
            jail.set_env("GALLERY_CACHE__ENRICH_CONCURRENCY", 2);
            jail.set_env("GALLERY_CACHE__FETCH_TIMEOUT_SECS", 0);
            let config = Config::load(Some(Path::new(CONFIG_FILE_NAME))).unwrap();
            assert_eq!(config.cache.enrich_concurrency, 2);
            assert_eq!(config.cache.fetch_timeout(), None);
            Ok(())
        });
    }

    #[test]
    fn env_only() {
        Jail::expect_with(|jail| {
            jail.set_env("GALLERY_SOURCE__ROOT", "/data");
            let config = Config::from_figment(Config::figment(None)).unwrap();
            assert_eq!(config.source.root, Some(PathBuf::from("/data")));
            assert_eq!(config.cache.fetch_timeout(), Some(Duration::from_secs(60)));
            Ok(())
        });
    }

    #[test]
    fn missing_explicit_file() {
        Jail::expect_with(|_jail| {
            let err = Config::load(Some(Path::new("nope.toml"))).unwrap_err();
            assert_eq!(*err, ErrorKind::NotFound(PathBuf::from("nope.toml")));
            Ok(())
        });
    }

    #[test]
    fn malformed_file() {
        Jail::expect_with(|jail| {
            jail.create_file(CONFIG_FILE_NAME, "[poll]\ninterval_secs = \"soon\"\n")?;
            let err = Config::load(Some(Path::new(CONFIG_FILE_NAME))).unwrap_err();
            assert_eq!(*err, ErrorKind::Load);
            Ok(())
        });
    }

    #[rstest]
    #[case::relative_root(|c: &mut Config| c.source.root = Some(PathBuf::from("photos")))]
    #[case::absolute_folder(|c: &mut Config| c.source.folder = PathBuf::from("/photos"))]
    #[case::zero_interval(|c: &mut Config| c.poll.interval_secs = 0)]
    #[case::cap_below_base(|c: &mut Config| c.poll.max_interval_secs = 10)]
    #[case::cap_above_a_week(|c: &mut Config| c.poll.max_interval_secs = u64::MAX)]
    #[case::negative_jitter(|c: &mut Config| c.poll.jitter = -0.1)]
    #[case::full_jitter(|c: &mut Config| c.poll.jitter = 1.0)]
    #[case::zero_concurrency(|c: &mut Config| c.cache.enrich_concurrency = 0)]
    #[case::zero_size(|c: &mut Config| c.thumbnail.max_size = 0)]
    #[case::default_above_max(|c: &mut Config| c.thumbnail.default_size = 2000)]
    fn invalid_values(#[case] mutate: fn(&mut Config)) {
        let mut config = valid();
        mutate(&mut config);
        let err = config.validate().unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }
}
