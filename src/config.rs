// Mon Oct 19 2026 - Alex

use crate::analysis::{BudgetSet, HotPathMatcher, TypeBudget};
use crate::error::{AuditError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CACHE_LINE_SIZE: u64 = 64;
pub const DEFAULT_PADDING_THRESHOLD: f64 = 0.25;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub cache_line_size: u64,
    /// Glob patterns (`*`, `?`) over qualified type names.
    pub hot_path_tags: Vec<String>,
    pub padding_threshold: f64,
    pub max_threads: usize,
    pub snapshot_dir: Option<PathBuf>,
    /// Per-type limits for `check`, keyed by exact name or glob.
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub budgets: IndexMap<String, TypeBudget>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            cache_line_size: DEFAULT_CACHE_LINE_SIZE,
            hot_path_tags: Vec::new(),
            padding_threshold: DEFAULT_PADDING_THRESHOLD,
            max_threads: num_cpus::get(),
            snapshot_dir: None,
            budgets: IndexMap::new(),
        }
    }
}

impl AuditConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a JSON config file; missing keys keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| AuditError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_cache_line_size(mut self, size: u64) -> Self {
        self.cache_line_size = size;
        self
    }

    pub fn with_hot_path_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hot_path_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_padding_threshold(mut self, threshold: f64) -> Self {
        self.padding_threshold = threshold;
        self
    }

    pub fn with_max_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads;
        self
    }

    pub fn with_snapshot_dir(mut self, dir: PathBuf) -> Self {
        self.snapshot_dir = Some(dir);
        self
    }

    pub fn with_budget(mut self, name: &str, budget: TypeBudget) -> Self {
        self.budgets.insert(name.to_string(), budget);
        self
    }

    pub fn budget_set(&self) -> Result<BudgetSet> {
        BudgetSet::compile(&self.budgets)
    }

    pub fn hot_path_matcher(&self) -> Result<HotPathMatcher> {
        HotPathMatcher::new(&self.hot_path_tags)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_line_size == 0 || !self.cache_line_size.is_power_of_two() {
            return Err(AuditError::Config(format!(
                "cache_line_size must be a power of two, got {}",
                self.cache_line_size
            )));
        }
        if !(0.0..=1.0).contains(&self.padding_threshold) {
            return Err(AuditError::Config(format!(
                "padding_threshold must be between 0.0 and 1.0, got {}",
                self.padding_threshold
            )));
        }
        if self.max_threads == 0 {
            return Err(AuditError::Config("max_threads must be greater than 0".to_string()));
        }
        self.hot_path_matcher()?;
        self.budget_set()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = AuditConfig::new();
        assert_eq!(config.cache_line_size, 64);
        assert!(config.max_threads > 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values() {
        assert!(AuditConfig::new().with_cache_line_size(48).validate().is_err());
        assert!(AuditConfig::new().with_cache_line_size(0).validate().is_err());
        assert!(AuditConfig::new().with_padding_threshold(1.5).validate().is_err());
        assert!(AuditConfig::new().with_max_threads(0).validate().is_err());
        assert!(matches!(
            AuditConfig::new().with_hot_path_tags([""]).validate(),
            Err(AuditError::Config(_))
        ));
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "cache_line_size": 128, "hot_path_tags": ["net::*"] }}"#).unwrap();

        let config = AuditConfig::from_file(file.path()).unwrap();
        assert_eq!(config.cache_line_size, 128);
        assert_eq!(config.padding_threshold, DEFAULT_PADDING_THRESHOLD);
        assert!(config.hot_path_matcher().unwrap().is_hot("net::Packet"));
        assert!(config.budgets.is_empty());
    }

    #[test]
    fn test_budgets_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "budgets": {{ "HotOrder": {{ "max_size": 64 }}, "net::*": {{ "max_padding_percent": 10.0 }} }} }}"#
        )
        .unwrap();

        let config = AuditConfig::from_file(file.path()).unwrap();
        let names: Vec<&str> = config.budgets.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["HotOrder", "net::*"]);
        assert_eq!(config.budgets["HotOrder"].max_size, Some(64));
        assert!(config.budget_set().unwrap().find("net::Packet").is_some());
    }

    #[test]
    fn test_invalid_budgets_rejected() {
        let bad = AuditConfig::new().with_budget("Huge", TypeBudget::new().with_max_padding_percent(150.0));
        assert!(matches!(bad.validate(), Err(AuditError::Config(_))));
        assert!(AuditConfig::new().with_budget("", TypeBudget::new()).validate().is_err());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "budgets": {{ "A": {{ "max_size": 0 }} }} }}"#).unwrap();
        assert!(AuditConfig::from_file(file.path()).is_err());
    }
}
