use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const APP_DOMAIN: &str = "com";
const APP_ORG: &str = "Bearming";
const APP_NAME: &str = "archive-toolkit";

pub const CONFIG_ENV: &str = "ARCHIVE_TOOLKIT_CONFIG";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn with_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<ArchiveConfig> {
        if !self.paths.config_file.exists() {
            let mut default_cfg = ArchiveConfig::default();
            default_cfg.post_load();
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<ArchiveConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: ArchiveConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load();
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &ArchiveConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var(CONFIG_ENV).ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        Ok(Self {
            config_dir,
            config_file,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArchiveConfig {
    pub page_size: usize,
    pub search_debounce_ms: u64,
    pub params: QueryParams,
    pub markup: MarkupOptions,
    pub locale: LocaleStrings,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            page_size: 25,
            search_debounce_ms: 140,
            params: QueryParams::default(),
            markup: MarkupOptions::default(),
            locale: LocaleStrings::default(),
        }
    }
}

impl ArchiveConfig {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    fn post_load(&mut self) {
        if self.page_size == 0 {
            tracing::warn!("page_size of 0 in config, using 1");
            self.page_size = 1;
        }
        if self.params.has_collisions() {
            tracing::warn!(params = ?self.params, "query parameter names collide, falling back to defaults");
            self.params = QueryParams::default();
        }
    }
}

/// Names of the query-string parameters the archive state is written to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct QueryParams {
    pub year: String,
    pub search: String,
    pub page: String,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            year: "y".into(),
            search: "s".into(),
            page: "p".into(),
        }
    }
}

impl QueryParams {
    fn has_collisions(&self) -> bool {
        let names = [&self.year, &self.search, &self.page];
        names.iter().any(|name| name.is_empty())
            || self.year == self.search
            || self.year == self.page
            || self.search == self.page
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MarkupOptions {
    pub body_class: String,
    pub container_id: String,
    pub tags_anchor_id: String,
}

impl Default for MarkupOptions {
    fn default() -> Self {
        Self {
            body_class: "blog".into(),
            container_id: "bearming-archive".into(),
            tags_anchor_id: "tags".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LocaleStrings {
    pub all_posts: String,
    pub search_placeholder: String,
    pub previous: String,
    pub next: String,
}

impl Default for LocaleStrings {
    fn default() -> Self {
        Self {
            all_posts: "All posts".into(),
            search_placeholder: "Search…".into(),
            previous: "Previous".into(),
            next: "Next".into(),
        }
    }
}
