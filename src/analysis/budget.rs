// Mon Oct 19 2026 - Alex

use crate::analysis::cache::glob_to_regex;
use crate::analysis::padding::TypeReport;
use crate::error::{AuditError, Result};
use ahash::AHashSet;
use indexmap::IndexMap;
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use std::fmt;

const PERCENT_EPSILON: f64 = 1e-6;

/// Limits one type (or every type matching a glob) must stay within.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypeBudget {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_padding: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_padding_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_false_sharing_warnings: Option<usize>,
}

impl TypeBudget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_size(mut self, size: u64) -> Self {
        self.max_size = Some(size);
        self
    }

    pub fn with_max_padding(mut self, bytes: u64) -> Self {
        self.max_padding = Some(bytes);
        self
    }

    pub fn with_max_padding_percent(mut self, percent: f64) -> Self {
        self.max_padding_percent = Some(percent);
        self
    }

    pub fn with_max_false_sharing_warnings(mut self, count: usize) -> Self {
        self.max_false_sharing_warnings = Some(count);
        self
    }

    pub fn validate(&self, name: &str) -> Result<()> {
        if let Some(percent) = self.max_padding_percent {
            if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
                return Err(AuditError::Config(format!(
                    "budget {}: max_padding_percent must be between 0 and 100, got {}",
                    name, percent
                )));
            }
        }
        if self.max_size == Some(0) {
            return Err(AuditError::Config(format!("budget {}: max_size must be greater than 0", name)));
        }
        Ok(())
    }

    fn violations(&self, report: &TypeReport) -> Vec<BudgetViolation> {
        let mut out = Vec::new();
        let violation = |kind, message| BudgetViolation {
            type_name: report.name.clone(),
            kind,
            message,
        };

        if let Some(max) = self.max_size.filter(|max| report.size > *max) {
            out.push(violation(
                ViolationKind::MaxSize,
                format!("size {} exceeds budget {} (+{} bytes)", report.size, max, report.size - max),
            ));
        }
        if let Some(max) = self.max_padding.filter(|max| report.padding_bytes > *max) {
            out.push(violation(
                ViolationKind::MaxPadding,
                format!(
                    "padding {} exceeds budget {} (+{} bytes)",
                    report.padding_bytes,
                    max,
                    report.padding_bytes - max
                ),
            ));
        }
        let percent = report.padding_ratio * 100.0;
        if let Some(max) = self.max_padding_percent.filter(|max| percent > max + PERCENT_EPSILON) {
            out.push(violation(
                ViolationKind::MaxPaddingPercent,
                format!("padding {:.1}% exceeds budget {:.1}%", percent, max),
            ));
        }
        let shared = report.false_sharing.len();
        if let Some(max) = self.max_false_sharing_warnings.filter(|max| shared > *max) {
            out.push(violation(
                ViolationKind::MaxFalseSharingWarnings,
                format!("{} false sharing warnings exceed limit {}", shared, max),
            ));
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MaxSize,
    MaxPadding,
    MaxPaddingPercent,
    MaxFalseSharingWarnings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetViolation {
    pub type_name: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl fmt::Display for BudgetViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

/// Result of checking a set of reports against budgets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetOutcome {
    pub checked: usize,
    pub violations: Vec<BudgetViolation>,
    /// Exact budget names with no type of that name.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub unmatched_names: Vec<String>,
    /// Glob budgets that matched nothing.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub unmatched_patterns: Vec<String>,
}

impl BudgetOutcome {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Budgets split into exact names and globs, ready to match.
///
/// An exact name always wins; otherwise the first glob in declaration order applies.
#[derive(Debug, Clone)]
pub struct BudgetSet {
    exact: IndexMap<String, TypeBudget>,
    patterns: Vec<(String, TypeBudget)>,
    set: RegexSet,
}

fn is_glob(name: &str) -> bool {
    name.contains('*') || name.contains('?')
}

impl BudgetSet {
    pub fn compile(budgets: &IndexMap<String, TypeBudget>) -> Result<Self> {
        let mut exact = IndexMap::new();
        let mut patterns = Vec::new();

        for (name, budget) in budgets {
            if name.trim().is_empty() {
                return Err(AuditError::Config("budget with an empty type name".to_string()));
            }
            budget.validate(name)?;
            if is_glob(name) {
                patterns.push((name.clone(), budget.clone()));
            } else {
                exact.insert(name.clone(), budget.clone());
            }
        }

        let set = RegexSet::new(patterns.iter().map(|(name, _)| glob_to_regex(name)))
            .map_err(|e| AuditError::Config(format!("budget pattern: {}", e)))?;
        Ok(Self { exact, patterns, set })
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.patterns.is_empty()
    }

    /// The budget for a type name and, for glob matches, the pattern's index.
    pub fn find(&self, type_name: &str) -> Option<(&TypeBudget, Option<usize>)> {
        if let Some(budget) = self.exact.get(type_name) {
            return Some((budget, None));
        }
        let index = self.set.matches(type_name).iter().next()?;
        self.patterns.get(index).map(|(_, budget)| (budget, Some(index)))
    }

    pub fn check(&self, reports: &[TypeReport]) -> BudgetOutcome {
        let mut outcome = BudgetOutcome::default();
        let mut pattern_used = vec![false; self.patterns.len()];
        let names: AHashSet<&str> = reports.iter().map(|r| r.name.as_str()).collect();

        for report in reports {
            let Some((budget, pattern)) = self.find(&report.name) else {
                continue;
            };
            if let Some(index) = pattern {
                pattern_used[index] = true;
            }
            outcome.checked += 1;
            outcome.violations.extend(budget.violations(report));
        }

        outcome.unmatched_names = self
            .exact
            .keys()
            .filter(|name| !names.contains(name.as_str()))
            .cloned()
            .collect();
        outcome.unmatched_patterns = self
            .patterns
            .iter()
            .zip(&pattern_used)
            .filter(|(_, used)| !**used)
            .map(|((name, _), _)| name.clone())
            .collect();

        for name in &outcome.unmatched_names {
            log::warn!("budget for {} matches no type in the binary", name);
        }
        for pattern in &outcome.unmatched_patterns {
            log::warn!("budget pattern {} matches no type", pattern);
        }
        log::info!(
            "budget check: {} types checked, {} violations",
            outcome.checked,
            outcome.violations.len()
        );
        outcome
    }
}
