//! Run configuration loaded from YAML.
//!
//! Relative paths (`boundary`, directory source `path`) are resolved against
//! the directory holding the config file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use albedo_common::DateRange;
use anyhow::{Context, Result};
use boundary::MinOverlap;
use chrono::NaiveDate;
use quality_mask::{CustomTierSpec, QualityTier, TierName};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PipelineError, PipelineResult};
use crate::retry::RetryPolicy;
use crate::sources::{DirectoryFrameSource, FrameSource, HttpFrameSource};

/// Root configuration for one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Path to a GeoJSON or WKT boundary file.
    pub boundary: PathBuf,
    #[serde(default = "default_quality_tier")]
    pub quality_tier: String,
    /// Required when `quality_tier` is `custom`.
    #[serde(default)]
    pub custom: Option<CustomTierSpec>,
    /// Overrides the optional-screen default of a named tier.
    #[serde(default)]
    pub screen_optional: Option<bool>,
    #[serde(default = "default_min_overlap_fraction")]
    pub min_overlap_fraction: f64,
    #[serde(default)]
    pub min_overlap_area: Option<f64>,
    #[serde(default = "default_min_count")]
    pub min_count: usize,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    #[serde(default)]
    pub retry: RetryConfig,
    pub source: SourceConfig,
}

fn default_quality_tier() -> String {
    "balanced".to_string()
}

fn default_min_overlap_fraction() -> f64 {
    boundary::DEFAULT_MIN_OVERLAP_FRACTION
}

fn default_min_count() -> usize {
    aggregator::DEFAULT_MIN_COUNT
}

fn default_max_concurrency() -> usize {
    4
}

/// Backoff settings for transient source failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
        }
    }
}

/// Where frames come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceConfig {
    Directory {
        path: PathBuf,
    },
    Http {
        base_url: String,
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

fn default_timeout_secs() -> u64 {
    60
}

impl RunConfig {
    /// Load and path-resolve a config file. Does not validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::from_yaml(&content, base_dir)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        info!(
            path = %path.display(),
            start = %config.start_date,
            end = %config.end_date,
            tier = %config.quality_tier,
            "Loaded run configuration"
        );
        Ok(config)
    }

    /// Parse YAML, resolving relative paths against `base_dir`.
    pub fn from_yaml(content: &str, base_dir: &Path) -> Result<Self> {
        let mut config: RunConfig = serde_yaml::from_str(content)?;
        config.resolve_paths(base_dir);
        Ok(config)
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        if self.boundary.is_relative() {
            self.boundary = base_dir.join(&self.boundary);
        }
        if let SourceConfig::Directory { path } = &mut self.source {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        }
    }

    /// Check everything that can be checked without touching the filesystem
    /// or network.
    pub fn validate(&self) -> PipelineResult<()> {
        self.date_range()?;
        self.resolve_tier()?;

        if !(0.0..=1.0).contains(&self.min_overlap_fraction) {
            return Err(PipelineError::Configuration(format!(
                "min_overlap_fraction must be within [0, 1], got {}",
                self.min_overlap_fraction
            )));
        }
        if let Some(area) = self.min_overlap_area {
            if !area.is_finite() || area < 0.0 {
                return Err(PipelineError::Configuration(format!(
                    "min_overlap_area must be a non-negative area, got {}",
                    area
                )));
            }
        }
        if self.max_concurrency == 0 {
            return Err(PipelineError::Configuration(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(PipelineError::Configuration(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if let SourceConfig::Http { base_url, .. } = &self.source {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(PipelineError::Configuration(format!(
                    "source base_url must be http(s): {}",
                    base_url
                )));
            }
        }

        debug!("Run configuration is valid");
        Ok(())
    }

    pub fn date_range(&self) -> PipelineResult<DateRange> {
        DateRange::new(self.start_date, self.end_date)
            .map_err(|e| PipelineError::Configuration(e.to_string()))
    }

    /// Resolve the configured tier, applying the `screen_optional` override to
    /// named tiers.
    pub fn resolve_tier(&self) -> PipelineResult<QualityTier> {
        let tier = QualityTier::resolve(&self.quality_tier, self.custom.as_ref())
            .map_err(|e| PipelineError::Configuration(e.to_string()))?;

        Ok(match self.screen_optional {
            Some(enabled) if tier.name() != TierName::Custom => tier.with_optional_screens(enabled),
            _ => tier,
        })
    }

    pub fn min_overlap(&self) -> MinOverlap {
        MinOverlap::from_config(self.min_overlap_fraction, self.min_overlap_area)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.to_policy()
    }

    pub fn build_source(&self) -> PipelineResult<Arc<dyn FrameSource>> {
        match &self.source {
            SourceConfig::Directory { path } => {
                if !path.is_dir() {
                    return Err(PipelineError::SourceSetup(format!(
                        "frame directory does not exist: {}",
                        path.display()
                    )));
                }
                Ok(Arc::new(DirectoryFrameSource::new(path.clone())))
            }
            SourceConfig::Http {
                base_url,
                timeout_secs,
            } => {
                let source =
                    HttpFrameSource::new(base_url.clone(), Duration::from_secs(*timeout_secs))
                        .map_err(|e| PipelineError::SourceSetup(e.to_string()))?;
                Ok(Arc::new(source))
            }
        }
    }
}
