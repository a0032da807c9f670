// src/render/environment.rs
use crate::utils::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const PRODUCTION_SITE_BASE: &str = "https://www.fashionphile.com/";
pub const STAGING_SITE_BASE: &str = "https://www.staging.fashionphile.com/";
pub const PRODUCTION_CDN_BASE: &str = "https://www.fashionphile.com/cdn/shop/files/";
pub const STAGING_CDN_BASE: &str = "https://www.staging.fashionphile.com/cdn/shop/files/";

/// Target storefront a rendered article is published to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Staging,
    #[default]
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "staging" | "stage" => Ok(Environment::Staging),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown environment '{other}' (expected staging or production)")),
        }
    }
}

/// Base URLs of one environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvironmentBases {
    pub site_base: String,
    pub cdn_base: String,
}

/// Site and CDN bases keyed by environment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvironmentMap {
    pub staging: EnvironmentBases,
    pub production: EnvironmentBases,
}

impl Default for EnvironmentMap {
    fn default() -> Self {
        Self {
            staging: EnvironmentBases {
                site_base: STAGING_SITE_BASE.to_string(),
                cdn_base: STAGING_CDN_BASE.to_string(),
            },
            production: EnvironmentBases {
                site_base: PRODUCTION_SITE_BASE.to_string(),
                cdn_base: PRODUCTION_CDN_BASE.to_string(),
            },
        }
    }
}

impl EnvironmentMap {
    /// Loads a JSON map of the form
    /// `{"staging": {"site_base": .., "cdn_base": ..}, "production": {..}}`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let shown = path.display().to_string();
        let raw = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::EnvironmentMapIo { path: shown.clone(), source })?;
        let map = Self::from_json(&raw)
            .map_err(|reason| ConfigError::EnvironmentMapFormat { path: shown.clone(), reason })?;
        tracing::info!("Loaded environment map from {}", shown);
        Ok(map)
    }

    pub fn from_json(raw: &str) -> Result<Self, String> {
        serde_json::from_str(raw).map_err(|e| e.to_string())
    }

    pub fn bases(&self, environment: Environment) -> &EnvironmentBases {
        match environment {
            Environment::Staging => &self.staging,
            Environment::Production => &self.production,
        }
    }

    /// Points every site/CDN URL of the other environment at `target`.
    pub fn rewrite(&self, html: &str, target: Environment) -> String {
        let to = self.bases(target);
        let from = match target {
            Environment::Staging => &self.production,
            Environment::Production => &self.staging,
        };

        // CDN first: its base may extend the site base.
        let mut pairs = vec![(&from.cdn_base, &to.cdn_base), (&from.site_base, &to.site_base)];
        pairs.sort_by_key(|(from, _)| std::cmp::Reverse(from.len()));

        let mut rewritten = html.to_string();
        for (from, to) in pairs {
            if from.is_empty() || from == to {
                continue;
            }
            rewritten = rewritten.replace(from.as_str(), to.as_str());
        }
        tracing::debug!("Rewrote article URLs for {}", target);
        rewritten
    }
}
