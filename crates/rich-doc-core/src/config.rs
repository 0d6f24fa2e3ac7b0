//! Configuration loading and discovery.
//!
//! Settings are layered with figment. From lowest to highest precedence:
//!
//! 1. Built-in defaults
//! 2. `~/.config/rich-doc/config.<ext>` (user config)
//! 3. Project files found by walking up from the search root
//! 4. Files passed explicitly (e.g. `--config`)
//! 5. `RICH_DOC_*` environment variables
//!
//! Project files are named `.richdoc.<ext>`, `richdoc.<ext>`,
//! `.rich-doc.<ext>` or `rich-doc.<ext>`, where `<ext>` is one of `toml`,
//! `yaml`, `yml` or `json`. Only the closest directory containing any of them
//! contributes, and all of its matches are merged in that order. The walk stops
//! at a directory containing `.git`.
//!
//! # Example
//! ```no_run
//! use camino::Utf8PathBuf;
//! use rich_doc_core::config::ConfigLoader;
//!
//! let cwd = Utf8PathBuf::try_from(std::env::current_dir().unwrap()).unwrap();
//! let (config, _sources) = ConfigLoader::new()
//!     .with_project_search(&cwd)
//!     .load()
//!     .unwrap();
//! let options = config.schema_options();
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};

use crate::DEFAULT_MAX_INPUT_BYTES;
use crate::error::{ConfigError, ConfigResult};
use crate::length::{CountUnit, DEFAULT_MAX_LENGTH, LengthPolicy};
use crate::schema::{DEFAULT_MAX_DEPTH, FieldPolicy, KindPolicy, SchemaOptions};

/// The configuration for rich-doc.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Log level for the application.
    pub log_level: LogLevel,
    /// Directory for JSONL log files (falls back to platform defaults if unset).
    pub log_dir: Option<Utf8PathBuf>,
    /// Maximum document length (default: 10 000).
    pub max_length: Option<usize>,
    /// Unit for `max_length`: `utf16` (default), `chars` or `bytes`.
    pub count_unit: Option<CountUnit>,
    /// Maximum element nesting accepted by the validator (default: 100).
    pub max_depth: Option<usize>,
    /// `ignore` (default) or `reject` keys outside the node model.
    pub unknown_fields: Option<FieldPolicy>,
    /// `reject` (default) or `preserve` element types outside the closed set.
    pub unknown_kinds: Option<KindPolicy>,
    /// Require list items inside lists and forbid bare top-level text.
    pub strict_nesting: bool,
    /// Maximum input size in bytes (default: 5 MiB).
    ///
    /// Applies to files read by the CLI and to documents sent to the MCP
    /// server.
    pub max_input_bytes: Option<usize>,
    /// Disable the input size limit entirely. `max_input_bytes` is then ignored.
    pub disable_input_limit: bool,
}

impl Config {
    /// Validator options described by this configuration.
    pub fn schema_options(&self) -> SchemaOptions {
        SchemaOptions {
            unknown_fields: self.unknown_fields.unwrap_or_default(),
            unknown_kinds: self.unknown_kinds.unwrap_or_default(),
            strict_nesting: self.strict_nesting,
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
        }
    }

    /// Length policy described by this configuration.
    pub fn length_policy(&self) -> LengthPolicy {
        LengthPolicy {
            max_length: self.max_length.unwrap_or(DEFAULT_MAX_LENGTH),
            unit: self.count_unit.unwrap_or_default(),
        }
    }

    /// Effective input size limit, or `None` when disabled.
    pub fn input_limit(&self) -> Option<usize> {
        if self.disable_input_limit {
            None
        } else {
            Some(self.max_input_bytes.unwrap_or(DEFAULT_MAX_INPUT_BYTES))
        }
    }
}

/// Log level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Verbose output for debugging and development.
    Debug,
    /// Standard operational information (default).
    #[default]
    Info,
    /// Warnings about potential issues.
    Warn,
    /// Errors that indicate failures.
    Error,
}

impl LogLevel {
    /// Returns the log level as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Which configuration files were merged by [`ConfigLoader::load`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSources {
    /// Project files from the closest directory, low to high precedence.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub project_files: Vec<Utf8PathBuf>,
    /// User config file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_file: Option<Utf8PathBuf>,
    /// Explicit files, in the order given.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigSources {
    /// The highest-precedence file that was loaded, if any.
    pub fn primary_file(&self) -> Option<&Utf8Path> {
        self.explicit_files
            .last()
            .or_else(|| self.project_files.last())
            .map(Utf8PathBuf::as_path)
            .or(self.user_file.as_deref())
    }
}

const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Application name for platform directories.
const APP_NAME: &str = "rich-doc";

/// Project file stems, lowest precedence first.
const APP_NAMES: &[&str] = &["richdoc", "rich-doc"];

const ENV_PREFIX: &str = "RICH_DOC_";

/// Builder for loading configuration from multiple sources.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    project_search_root: Option<Utf8PathBuf>,
    include_user_config: bool,
    boundary_marker: Option<String>,
    explicit_files: Vec<Utf8PathBuf>,
}

impl ConfigLoader {
    /// A loader that reads user config and stops project search at `.git`.
    pub fn new() -> Self {
        Self {
            project_search_root: None,
            include_user_config: true,
            boundary_marker: Some(".git".to_string()),
            explicit_files: Vec::new(),
        }
    }

    /// Walk up from `path` looking for project files.
    #[must_use]
    pub fn with_project_search<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.project_search_root = Some(path.as_ref().to_path_buf());
        self
    }

    /// Whether to read `~/.config/rich-doc/config.<ext>`.
    #[must_use]
    pub const fn with_user_config(mut self, include: bool) -> Self {
        self.include_user_config = include;
        self
    }

    /// Stop the upward walk at a directory containing `marker`.
    #[must_use]
    pub fn with_boundary_marker<S: Into<String>>(mut self, marker: S) -> Self {
        self.boundary_marker = Some(marker.into());
        self
    }

    /// Walk all the way to the filesystem root.
    #[must_use]
    pub fn without_boundary_marker(mut self) -> Self {
        self.boundary_marker = None;
        self
    }

    /// Load `path` after any discovered files. Later calls win.
    #[must_use]
    pub fn with_file<P: AsRef<Utf8Path>>(mut self, path: P) -> Self {
        self.explicit_files.push(path.as_ref().to_path_buf());
        self
    }

    /// Merge every source and extract the configuration.
    #[tracing::instrument(skip(self), fields(search_root = ?self.project_search_root))]
    pub fn load(self) -> ConfigResult<(Config, ConfigSources)> {
        tracing::debug!("loading configuration");

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let mut sources = ConfigSources::default();

        if self.include_user_config
            && let Some(user_config) = find_user_config()
        {
            figment = merge_file(figment, &user_config);
            sources.user_file = Some(user_config);
        }

        if let Some(root) = &self.project_search_root {
            sources.project_files = self.find_project_configs(root);
            for file in &sources.project_files {
                figment = merge_file(figment, file);
            }
        }

        for file in &self.explicit_files {
            figment = merge_file(figment, file);
        }
        sources.explicit_files = self.explicit_files;

        // RICH_DOC_MAX_LENGTH=500, RICH_DOC_STRICT_NESTING=true, ...
        figment = figment.merge(Env::prefixed(ENV_PREFIX).lowercase(true));

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::Deserialize(Box::new(e)))?;

        tracing::info!(
            log_level = config.log_level.as_str(),
            files = sources.project_files.len() + sources.explicit_files.len(),
            "configuration loaded"
        );
        Ok((config, sources))
    }

    /// Like [`load`](Self::load), but fail if no file was found at all.
    pub fn load_or_error(self) -> ConfigResult<(Config, ConfigSources)> {
        let has_user = self.include_user_config && find_user_config().is_some();
        let has_project = self
            .project_search_root
            .as_ref()
            .is_some_and(|root| !self.find_project_configs(root).is_empty());

        if !has_user && !has_project && self.explicit_files.is_empty() {
            return Err(ConfigError::NotFound);
        }
        self.load()
    }

    /// Project files in the closest directory at or above `start` that has any.
    fn find_project_configs(&self, start: &Utf8Path) -> Vec<Utf8PathBuf> {
        for dir in start.ancestors() {
            let found = configs_in(dir);
            if !found.is_empty() {
                return found;
            }
            // A config beside the marker still counts; checked after the files.
            if let Some(marker) = &self.boundary_marker
                && dir != start
                && dir.join(marker).exists()
            {
                break;
            }
        }
        Vec::new()
    }
}

/// Matching files in `dir`: per stem, dotfile before regular, each in extension order.
fn configs_in(dir: &Utf8Path) -> Vec<Utf8PathBuf> {
    APP_NAMES
        .iter()
        .flat_map(|name| [format!(".{name}"), (*name).to_string()])
        .flat_map(|stem| CONFIG_EXTENSIONS.iter().map(move |ext| format!("{stem}.{ext}")))
        .map(|file| dir.join(file))
        .filter(|path| path.is_file())
        .collect()
}

fn find_user_config() -> Option<Utf8PathBuf> {
    let dir = user_config_dir()?;
    CONFIG_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("config.{ext}")))
        .find(|path| path.is_file())
}

/// Merge a config file, choosing the format from its extension.
fn merge_file(figment: Figment, path: &Utf8Path) -> Figment {
    match path.extension() {
        Some("yaml" | "yml") => figment.merge(Yaml::file_exact(path.as_str())),
        Some("json") => figment.merge(Json::file_exact(path.as_str())),
        _ => figment.merge(Toml::file_exact(path.as_str())),
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// The user config directory, e.g. `~/.config/rich-doc/` on Linux.
pub fn user_config_dir() -> Option<Utf8PathBuf> {
    let dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(dirs.config_dir().to_path_buf()).ok()
}

/// The machine-local data directory, e.g. `~/.local/share/rich-doc/` on Linux.
pub fn user_data_local_dir() -> Option<Utf8PathBuf> {
    let dirs = project_dirs()?;
    Utf8PathBuf::from_path_buf(dirs.data_local_dir().to_path_buf()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Serializes tests that touch process environment variables.
    static TEST_ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        TEST_ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn utf8(path: std::path::PathBuf) -> Utf8PathBuf {
        Utf8PathBuf::try_from(path).unwrap()
    }

    fn load_file(name: &str, contents: &str) -> Config {
        let _lock = lock_env();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(name);
        fs::write(&path, contents).unwrap();
        let (config, _sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_file(utf8(path))
            .load()
            .unwrap();
        config
    }

    #[test]
    fn defaults_translate_to_core_defaults() {
        let config = Config::default();
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(config.log_dir.is_none());
        assert_eq!(config.schema_options(), SchemaOptions::default());
        assert_eq!(config.length_policy(), LengthPolicy::default());
        assert_eq!(config.input_limit(), Some(DEFAULT_MAX_INPUT_BYTES));
    }

    #[test]
    fn loads_with_no_files() {
        let _lock = lock_env();
        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .load()
            .unwrap();
        assert_eq!(config.log_level, LogLevel::Info);
        assert!(sources.primary_file().is_none());
    }

    #[test]
    fn toml_sets_every_field() {
        let config = load_file(
            "config.toml",
            r#"log_level = "debug"
log_dir = "/tmp/rich-doc"
max_length = 280
count_unit = "chars"
max_depth = 8
unknown_fields = "reject"
unknown_kinds = "preserve"
strict_nesting = true
max_input_bytes = 4096
"#,
        );
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.log_dir.as_deref().map(Utf8Path::as_str), Some("/tmp/rich-doc"));
        assert_eq!(
            config.length_policy(),
            LengthPolicy::new(280).with_unit(CountUnit::Chars)
        );
        assert_eq!(
            config.schema_options(),
            SchemaOptions {
                unknown_fields: FieldPolicy::Reject,
                unknown_kinds: KindPolicy::Preserve,
                strict_nesting: true,
                max_depth: 8,
            }
        );
        assert_eq!(config.input_limit(), Some(4096));
    }

    #[test]
    fn yaml_and_json_are_supported() {
        let config = load_file("config.yaml", "max_length: 50\ncount_unit: bytes\n");
        assert_eq!(config.length_policy(), LengthPolicy::new(50).with_unit(CountUnit::Bytes));

        let config = load_file("config.json", r#"{ "strict_nesting": true }"#);
        assert!(config.schema_options().strict_nesting);
    }

    #[test]
    fn invalid_value_is_a_deserialize_error() {
        let _lock = lock_env();
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, r#"count_unit = "words""#).unwrap();
        let result = ConfigLoader::new()
            .with_user_config(false)
            .with_file(utf8(path))
            .load();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[test]
    fn later_file_overrides_earlier() {
        let _lock = lock_env();
        let tmp = TempDir::new().unwrap();
        let base = tmp.path().join("base.toml");
        fs::write(&base, "max_length = 100\n").unwrap();
        let over = tmp.path().join("override.toml");
        fs::write(&over, "max_length = 200\n").unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_file(utf8(base))
            .with_file(utf8(over.clone()))
            .load()
            .unwrap();

        assert_eq!(config.max_length, Some(200));
        assert_eq!(sources.primary_file(), Some(utf8(over).as_path()));
    }

    #[test]
    fn project_config_found_from_subdirectory() {
        let _lock = lock_env();
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("project");
        let deep = project.join("docs").join("drafts");
        fs::create_dir_all(&deep).unwrap();
        fs::write(project.join(".richdoc.toml"), "max_depth = 12\n").unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .with_project_search(utf8(deep))
            .load()
            .unwrap();

        assert_eq!(config.max_depth, Some(12));
        assert_eq!(sources.project_files.len(), 1);
    }

    #[test]
    fn boundary_marker_stops_search() {
        let _lock = lock_env();
        let tmp = TempDir::new().unwrap();
        let parent = tmp.path().join("parent");
        let repo = parent.join("repo");
        let work = repo.join("work");
        fs::create_dir_all(&work).unwrap();
        fs::write(parent.join(".rich-doc.toml"), "max_length = 1\n").unwrap();
        fs::create_dir(repo.join(".git")).unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .with_boundary_marker(".git")
            .with_project_search(utf8(work))
            .load()
            .unwrap();

        assert!(config.max_length.is_none());
        assert!(sources.project_files.is_empty());
    }

    #[test]
    fn file_stems_merge_in_precedence_order() {
        let _lock = lock_env();
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".richdoc.toml"), "max_length = 1\nmax_depth = 3\n").unwrap();
        fs::write(tmp.path().join("richdoc.yaml"), "max_length: 2\n").unwrap();
        fs::write(tmp.path().join(".rich-doc.json"), r#"{ "max_length": 3 }"#).unwrap();
        fs::write(tmp.path().join("rich-doc.toml"), "max_length = 4\n").unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .with_project_search(utf8(tmp.path().to_path_buf()))
            .load()
            .unwrap();

        assert_eq!(config.max_length, Some(4));
        assert_eq!(config.max_depth, Some(3));
        let names: Vec<&str> = sources
            .project_files
            .iter()
            .filter_map(|p| p.file_name())
            .collect();
        assert_eq!(
            names,
            [".richdoc.toml", "richdoc.yaml", ".rich-doc.json", "rich-doc.toml"]
        );
    }

    #[test]
    fn only_closest_directory_contributes() {
        let _lock = lock_env();
        let tmp = TempDir::new().unwrap();
        let parent = tmp.path().join("parent");
        let child = parent.join("child");
        fs::create_dir_all(&child).unwrap();
        fs::write(parent.join("rich-doc.toml"), "strict_nesting = true\n").unwrap();
        fs::write(child.join(".richdoc.toml"), "max_length = 9\n").unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .with_project_search(utf8(child))
            .load()
            .unwrap();

        assert_eq!(config.max_length, Some(9));
        assert!(!config.strict_nesting);
        assert_eq!(sources.project_files.len(), 1);
    }

    #[test]
    fn explicit_file_overrides_project_config() {
        let _lock = lock_env();
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".rich-doc.toml"), "max_length = 10\n").unwrap();
        let explicit = tmp.path().join("override.toml");
        fs::write(&explicit, "max_length = 20\n").unwrap();

        let (config, sources) = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .with_project_search(utf8(tmp.path().to_path_buf()))
            .with_file(utf8(explicit))
            .load()
            .unwrap();

        assert_eq!(config.max_length, Some(20));
        assert!(!sources.project_files.is_empty());
        assert_eq!(sources.explicit_files.len(), 1);
    }

    #[test]
    fn load_or_error_fails_when_no_config() {
        let _lock = lock_env();
        let result = ConfigLoader::new()
            .with_user_config(false)
            .without_boundary_marker()
            .load_or_error();
        assert!(matches!(result, Err(ConfigError::NotFound)));
    }

    #[test]
    fn disable_input_limit_wins() {
        let config = load_file(
            "config.toml",
            "max_input_bytes = 1024\ndisable_input_limit = true\n",
        );
        assert_eq!(config.max_input_bytes, Some(1024));
        assert_eq!(config.input_limit(), None);
    }

    #[test]
    fn deserializes_from_yaml_directly() {
        let config: Config =
            serde_yaml::from_str("unknown_kinds: preserve\nlog_level: warn\n").unwrap();
        assert_eq!(config.unknown_kinds, Some(KindPolicy::Preserve));
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn user_config_dir_uses_app_name() {
        if let Some(path) = user_config_dir() {
            assert!(path.as_str().contains("rich-doc"));
        }
    }

    #[test]
    #[allow(unsafe_code)]
    fn env_var_overrides_file_config() {
        let _lock = lock_env();

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "max_length = 100\ncount_unit = \"bytes\"\n").unwrap();

        // SAFETY: TEST_ENV_MUTEX serializes environment access.
        unsafe {
            std::env::set_var("RICH_DOC_MAX_LENGTH", "300");
            std::env::set_var("RICH_DOC_STRICT_NESTING", "true");
        }

        let result = ConfigLoader::new()
            .with_user_config(false)
            .with_file(utf8(path))
            .load();

        // SAFETY: as above.
        unsafe {
            std::env::remove_var("RICH_DOC_MAX_LENGTH");
            std::env::remove_var("RICH_DOC_STRICT_NESTING");
        }

        let (config, _sources) = result.unwrap();
        assert_eq!(config.max_length, Some(300));
        assert_eq!(config.count_unit, Some(CountUnit::Bytes));
        assert!(config.strict_nesting);
    }
}
