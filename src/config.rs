// src/config.rs
use crate::extractors::spatial::Rect;
use crate::fetch::client::{DEFAULT_DELAY_MS, DEFAULT_TIMEOUT_SECS};
use crate::render::links::DEFAULT_LEGACY_HOST;
use crate::render::{Environment, EnvironmentMap, RenderOptions};
use crate::utils::error::ConfigError;
use std::path::{Path, PathBuf};

/// Settings for one migration run, resolved from the command line and environment.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub output_dir: PathBuf,
    pub environment: Environment,
    pub environment_map: EnvironmentMap,
    pub render: RenderOptions,
    pub fetch_timeout_secs: u64,
    pub delay_ms: u64,
    /// File name of the batch CSV, written only when set.
    pub csv_filename: Option<String>,
    pub debug: bool,
    /// Interactive-style extraction of a single region instead of the whole article.
    pub selection: Option<Rect>,
}

impl MigrationConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            environment: Environment::default(),
            environment_map: EnvironmentMap::default(),
            render: RenderOptions::default(),
            fetch_timeout_secs: DEFAULT_TIMEOUT_SECS,
            delay_ms: DEFAULT_DELAY_MS,
            csv_filename: None,
            debug: false,
            selection: None,
        }
    }

    /// Replaces the built-in environment bases with those from a JSON file.
    pub fn with_environment_map_file(mut self, path: &Path) -> Result<Self, ConfigError> {
        self.environment_map = EnvironmentMap::from_file(path)?;
        Ok(self)
    }

    /// Treats `hosts` as legacy blog hosts in addition to the default one.
    pub fn with_legacy_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all = vec![DEFAULT_LEGACY_HOST.to_string()];
        for host in hosts {
            let host = host.into().trim().to_ascii_lowercase();
            if !host.is_empty() && !all.contains(&host) {
                all.push(host);
            }
        }
        self.render = RenderOptions::with_legacy_hosts(all);
        self
    }

    /// Points the rendered markup at the target environment's site and CDN.
    pub fn finalize_html(&self, html: &str) -> String {
        self.environment_map.rewrite(html, self.environment)
    }
}
