pub mod conf_serde;

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use figment::{
    Figment,
    providers::{Format, Serialized, Yaml},
};
use kfilter_core::{ComparableFilter, NsName, NsNameParseError, filter};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

use crate::runtime::{cli::Cli, conf::conf_serde::level};

/// Describes which filter to construct.
///
/// The `type` key selects the variant:
///
/// ```yaml
/// filter:
///   type: labels
///   match_labels:
///     app: web
/// ```
///
/// YAML reads an unquoted `null` as the null value rather than a string, so
/// `type: null`, `type: "null"` and a missing `type` all select
/// [`FilterConf::Null`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "RawFilterConf", into = "RawFilterConf")]
pub enum FilterConf {
    /// Accept every object.
    #[default]
    Null,
    /// Reject every object.
    All,
    /// Accept objects carrying all of these labels.
    Labels {
        match_labels: BTreeMap<String, String>,
    },
    /// Accept Services whose selector matches these labels.
    ServiceFor { selector: BTreeMap<String, String> },
    /// Accept objects named `namespace/name` (or `name` when cluster-scoped).
    NsName { names: Vec<String> },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
enum FilterKind {
    #[default]
    Null,
    All,
    Labels,
    ServiceFor,
    NsName,
}

/// On-disk shape of a `filter:` block. Fields that do not belong to the
/// selected type are ignored.
#[derive(Debug, Default, Deserialize, Serialize)]
struct RawFilterConf {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<FilterKind>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    match_labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    selector: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    names: Vec<String>,
}

impl From<RawFilterConf> for FilterConf {
    fn from(raw: RawFilterConf) -> Self {
        match raw.kind.unwrap_or_default() {
            FilterKind::Null => FilterConf::Null,
            FilterKind::All => FilterConf::All,
            FilterKind::Labels => FilterConf::Labels {
                match_labels: raw.match_labels,
            },
            FilterKind::ServiceFor => FilterConf::ServiceFor {
                selector: raw.selector,
            },
            FilterKind::NsName => FilterConf::NsName { names: raw.names },
        }
    }
}

impl RawFilterConf {
    fn of(kind: FilterKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }
}

impl From<FilterConf> for RawFilterConf {
    fn from(conf: FilterConf) -> Self {
        match conf {
            FilterConf::Null => RawFilterConf::of(FilterKind::Null),
            FilterConf::All => RawFilterConf::of(FilterKind::All),
            FilterConf::Labels { match_labels } => RawFilterConf {
                match_labels,
                ..RawFilterConf::of(FilterKind::Labels)
            },
            FilterConf::ServiceFor { selector } => RawFilterConf {
                selector,
                ..RawFilterConf::of(FilterKind::ServiceFor)
            },
            FilterConf::NsName { names } => RawFilterConf {
                names,
                ..RawFilterConf::of(FilterKind::NsName)
            },
        }
    }
}

impl FilterConf {
    /// Builds the filter described by this configuration.
    ///
    /// # Errors
    /// * `ConfigError::InvalidObjectName` - An `ns_name` entry is not a valid
    ///   `namespace/name` string.
    pub fn build(&self) -> Result<ComparableFilter, ConfigError> {
        let filter = match self {
            FilterConf::Null => filter::null(),
            FilterConf::All => filter::all(),
            FilterConf::Labels { match_labels } => filter::labels(match_labels.clone()),
            FilterConf::ServiceFor { selector } => filter::service_for(selector.clone()),
            FilterConf::NsName { names } => {
                let ids = names
                    .iter()
                    .map(|name| {
                        name.parse::<NsName>()
                            .map_err(|source| ConfigError::InvalidObjectName {
                                name: name.clone(),
                                source,
                            })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                filter::ns_name(ids)
            }
        };

        Ok(filter)
    }
}

/// Application configuration.
///
/// Values are layered: built-in defaults, then the YAML configuration file,
/// then command line arguments and environment variables.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Conf {
    /// Path the configuration was read from. Never serialized.
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(with = "level")]
    pub log_level: Level,

    /// The filter applied to objects.
    #[serde(default)]
    pub filter: FilterConf,
}

impl Default for Conf {
    fn default() -> Self {
        Self {
            config_path: None,
            log_level: Level::INFO,
            filter: FilterConf::default(),
        }
    }
}

impl Conf {
    /// Loads configuration from defaults, the optional config file and the CLI.
    ///
    /// # Errors
    /// * `ConfigError::ConfigFileNotFound` - The config path does not exist.
    /// * `ConfigError::InvalidConfigPath` - The config path is a directory.
    /// * `ConfigError::InvalidExtension` - The config file is not `yaml`/`yml`.
    /// * `ConfigError::Extraction` - The merged configuration could not be parsed.
    pub fn new(cli: Cli) -> Result<(Self, Cli), ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Conf::default()));

        let config_path_to_store = if let Some(config_path) = &cli.config {
            validate_config_path(config_path)?;
            figment = figment.merge(Yaml::file(config_path));
            Some(config_path.clone())
        } else {
            None
        };

        figment = figment.merge(Serialized::defaults(&cli));

        let mut conf: Conf = figment.extract()?;

        conf.config_path = config_path_to_store;
        Ok((conf, cli))
    }

    /// Loads configuration from defaults and the given file only.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        validate_config_path(path)?;

        let mut conf: Conf = Figment::new()
            .merge(Serialized::defaults(Conf::default()))
            .merge(Yaml::file(path))
            .extract()?;
        conf.config_path = Some(path.to_path_buf());

        Ok(conf)
    }

    /// Re-reads the configuration file.
    ///
    /// The file is layered over the defaults rather than the current values,
    /// so labels removed from the file are removed from the filter too.
    /// The log level is kept from the current configuration.
    ///
    /// # Errors
    /// * `ConfigError::NoConfigFile` - No configuration file was loaded.
    /// * Any error returned by [`Conf::from_file`].
    pub fn reload(&self) -> Result<Self, ConfigError> {
        let Some(path) = &self.config_path else {
            return Err(ConfigError::NoConfigFile);
        };

        let mut conf = Self::from_file(path)?;
        conf.log_level = self.log_level;

        Ok(conf)
    }
}

/// Validates that the given path points to an existing file with a supported extension.
fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    if !path.is_file() {
        if path.exists() {
            return Err(ConfigError::InvalidConfigPath(
                path.to_string_lossy().into_owned(),
            ));
        } else {
            return Err(ConfigError::ConfigFileNotFound(
                path.to_string_lossy().into_owned(),
            ));
        }
    }

    match path.extension().and_then(|s| s.to_str()) {
        Some("yaml") | Some("yml") => Ok(()),
        Some(ext) => Err(ConfigError::InvalidExtension(ext.to_string())),
        None => Err(ConfigError::InvalidExtension("none".to_string())),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file was loaded.
    #[error("no config file provided")]
    NoConfigFile,

    /// The configuration file does not exist.
    #[error("config file '{0}' does not exist")]
    ConfigFileNotFound(String),

    /// The path exists but is not a file.
    #[error("path '{0}' is not a valid file")]
    InvalidConfigPath(String),

    /// The file has an unsupported extension.
    #[error("invalid file extension '.{0}', expected 'yaml' or 'yml'")]
    InvalidExtension(String),

    /// The merged configuration could not be extracted.
    #[error("configuration error: {0}")]
    Extraction(#[source] Box<figment::Error>),

    /// An `ns_name` filter entry could not be parsed.
    #[error("invalid object name '{name}' in ns_name filter: {source}")]
    InvalidObjectName {
        name: String,
        #[source]
        source: NsNameParseError,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Extraction(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use clap::Parser;
    use figment::Jail;
    use kfilter_core::{NsName, filter};
    use tracing::Level;

    use super::{Conf, ConfigError, FilterConf};
    use crate::runtime::cli::Cli;

    #[test]
    fn default_impl_is_null_filter() {
        let cfg = Conf::default();
        assert_eq!(cfg.config_path, None);
        assert_eq!(cfg.log_level, Level::INFO);
        assert_eq!(cfg.filter, FilterConf::Null);
    }

    #[test]
    fn new_succeeds_without_config_path() {
        Jail::expect_with(|_| {
            let cli = Cli::parse_from(["kfilter"]);
            let (cfg, _cli) = Conf::new(cli).expect("config should load without path");
            assert_eq!(cfg.config_path, None);
            assert_eq!(cfg.filter, FilterConf::Null);

            Ok(())
        })
    }

    #[test]
    fn new_errors_with_nonexistent_config_file() {
        Jail::expect_with(|_| {
            let cli = Cli::parse_from(["kfilter", "--config", "nonexistent.yaml"]);
            let err = Conf::new(cli).expect_err("expected error with nonexistent file");
            assert!(
                matches!(err, ConfigError::ConfigFileNotFound(_)),
                "unexpected error: {err}"
            );

            Ok(())
        })
    }

    #[test]
    fn new_errors_with_directory_as_config_path() {
        Jail::expect_with(|jail| {
            jail.create_dir("a_directory")?;

            let cli = Cli::parse_from(["kfilter", "--config", "a_directory"]);
            let err = Conf::new(cli).expect_err("expected error with directory path");
            let msg = err.to_string();
            assert!(msg.contains("is not a valid file"), "unexpected error: {msg}");

            Ok(())
        })
    }

    #[test]
    fn new_errors_with_invalid_extension() {
        Jail::expect_with(|jail| {
            jail.create_file("kfilter.toml", "log_level = 'info'")?;

            let cli = Cli::parse_from(["kfilter", "--config", "kfilter.toml"]);
            let err = Conf::new(cli).expect_err("expected error with toml file");
            assert!(
                matches!(&err, ConfigError::InvalidExtension(ext) if ext == "toml"),
                "unexpected error: {err}"
            );

            Ok(())
        })
    }

    #[test]
    fn loads_labels_filter_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "kfilter.yaml",
                r#"
log_level: debug
filter:
  type: labels
  match_labels:
    app: web
    tier: frontend
"#,
            )?;

            let cli = Cli::parse_from(["kfilter", "--config", "kfilter.yaml"]);
            let (cfg, _cli) = Conf::new(cli).expect("config should load");
            assert_eq!(cfg.log_level, Level::DEBUG);
            assert_eq!(
                cfg.config_path.as_deref(),
                Some(Path::new("kfilter.yaml"))
            );

            let built = cfg.filter.build().expect("filter should build");
            assert!(built.equals(&filter::labels([("tier", "frontend"), ("app", "web")])));

            Ok(())
        })
    }

    #[test]
    fn cli_log_level_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("kfilter.yaml", "log_level: debug\n")?;

            let cli = Cli::parse_from(["kfilter", "-c", "kfilter.yaml", "--log-level", "warn"]);
            let (cfg, _cli) = Conf::new(cli).expect("config should load");
            assert_eq!(cfg.log_level, Level::WARN);

            Ok(())
        })
    }

    #[test]
    fn env_log_level_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("kfilter.yaml", "log_level: debug\n")?;
            jail.set_env("KFILTER_LOG_LEVEL", "error");

            let cli = Cli::parse_from(["kfilter", "-c", "kfilter.yaml"]);
            let (cfg, _cli) = Conf::new(cli).expect("config should load");
            assert_eq!(cfg.log_level, Level::ERROR);

            Ok(())
        })
    }

    #[test]
    fn null_type_loads_unquoted_quoted_and_missing() {
        for body in [
            "filter:\n  type: null\n",
            "filter:\n  type: \"null\"\n",
            "filter:\n  type: ~\n",
            "filter: {}\n",
            "log_level: info\n",
        ] {
            Jail::expect_with(|jail| {
                jail.create_file("kfilter.yaml", body)?;

                let cli = Cli::parse_from(["kfilter", "-c", "kfilter.yaml"]);
                let (cfg, _cli) = Conf::new(cli).expect("config should load");
                assert_eq!(cfg.filter, FilterConf::Null, "config: {body:?}");

                Ok(())
            });
        }
    }

    #[test]
    fn unknown_filter_type_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("kfilter.yaml", "filter:\n  type: everything\n")?;

            let err = Conf::from_file(Path::new("kfilter.yaml")).expect_err("expected bad type");
            assert!(
                matches!(err, ConfigError::Extraction(_)),
                "unexpected error: {err}"
            );

            Ok(())
        })
    }

    #[test]
    fn fields_of_other_filter_types_are_ignored() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "kfilter.yaml",
                "filter:\n  type: all\n  match_labels:\n    app: web\n",
            )?;

            let cfg = Conf::from_file(Path::new("kfilter.yaml")).expect("config should load");
            assert_eq!(cfg.filter, FilterConf::All);

            Ok(())
        })
    }

    #[test]
    fn builds_every_filter_kind() {
        assert!(FilterConf::Null.build().unwrap().equals(&filter::null()));
        assert!(FilterConf::All.build().unwrap().equals(&filter::all()));

        let service_for = FilterConf::ServiceFor {
            selector: [("app".to_string(), "web".to_string())].into(),
        };
        assert!(
            service_for
                .build()
                .unwrap()
                .equals(&filter::service_for([("app", "web")]))
        );

        let ns_name = FilterConf::NsName {
            names: vec!["default/web".to_string(), "node-1".to_string()],
        };
        assert!(ns_name.build().unwrap().equals(&filter::ns_name([
            NsName::new("default", "web"),
            NsName::new("", "node-1"),
        ])));
    }

    #[test]
    fn build_rejects_malformed_names() {
        let conf = FilterConf::NsName {
            names: vec!["a/b/c".to_string()],
        };
        let err = conf.build().expect_err("expected malformed name error");
        assert!(
            matches!(&err, ConfigError::InvalidObjectName { name, .. } if name == "a/b/c"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn reload_errors_without_config_file() {
        let err = Conf::default().reload().expect_err("expected missing file error");
        assert!(matches!(err, ConfigError::NoConfigFile));
    }

    #[test]
    fn reload_replaces_filter_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "kfilter.yaml",
                "filter:\n  type: labels\n  match_labels:\n    app: web\n",
            )?;

            let cli = Cli::parse_from(["kfilter", "-c", "kfilter.yaml", "-l", "warn"]);
            let (cfg, _cli) = Conf::new(cli).expect("config should load");

            jail.create_file(
                "kfilter.yaml",
                "filter:\n  type: labels\n  match_labels:\n    tier: db\n",
            )?;
            let reloaded = cfg.reload().expect("config should reload");

            assert_eq!(reloaded.log_level, Level::WARN);
            let before = cfg.filter.build().expect("filter should build");
            let after = reloaded.filter.build().expect("filter should build");
            assert!(!before.equals(&after));
            assert!(after.equals(&filter::labels([("tier", "db")])));

            Ok(())
        })
    }
}
