// Mon Oct 19 2026 - Alex

use crate::analysis::cache::{CacheFit, HotPathMatcher};
use crate::analysis::false_sharing::{analyze_false_sharing, FalseSharingWarning};
use crate::analysis::reorder::{reorder_candidate, ReorderCandidate};
use crate::config::AuditConfig;
use crate::error::Result;
use crate::structure::{PaddingGap, Snapshot, TypeKind, TypeLayout};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-type waste and fit figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeReport {
    pub name: String,
    pub kind: TypeKind,
    pub size: u64,
    pub align: u64,
    pub used_bytes: u64,
    pub padding_bytes: u64,
    pub padding_ratio: f64,
    pub reorderable: bool,
    pub cache_unfriendly: bool,
    pub is_packed: bool,
    pub is_hot: bool,
    pub excessive_padding: bool,
    pub cache_lines_spanned: u64,
    pub cache_line_density: f64,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub gaps: Vec<PaddingGap>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub unresolved_members: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reorder: Option<ReorderCandidate>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub false_sharing: Vec<FalseSharingWarning>,
}

impl fmt::Display for TypeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: size {}, align {}, padding {} ({:.1}%)",
            self.kind,
            self.name,
            self.size,
            self.align,
            self.padding_bytes,
            self.padding_ratio * 100.0
        )?;
        if let Some(reorder) = self.reorder.as_ref().filter(|r| r.improves()) {
            write!(f, ", reorder saves {} bytes", reorder.savings_bytes)?;
        }
        if self.cache_unfriendly {
            write!(f, ", cache-unfriendly")?;
        }
        if self.is_packed {
            write!(f, ", packed")?;
        }
        Ok(())
    }
}

/// Padding bytes definitely wasted. A gap running into an unresolved member
/// only counts up to that member, since its real extent is unknown.
pub fn attributed_padding(layout: &TypeLayout) -> u64 {
    let unknown: Vec<u64> = layout
        .members
        .iter()
        .filter(|m| m.is_unresolved())
        .map(|m| m.offset)
        .collect();

    layout
        .gaps
        .iter()
        .map(|gap| {
            let end = gap.offset.saturating_add(gap.size);
            unknown
                .iter()
                .filter(|offset| (gap.offset..end).contains(*offset))
                .min()
                .map_or(gap.size, |offset| offset - gap.offset)
        })
        .sum()
}

pub struct PaddingAnalyzer {
    line_size: u64,
    padding_threshold: f64,
    hot: HotPathMatcher,
}

impl PaddingAnalyzer {
    pub fn new(config: &AuditConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            line_size: config.cache_line_size,
            padding_threshold: config.padding_threshold,
            hot: config.hot_path_matcher()?,
        })
    }

    pub fn with_matcher(mut self, hot: HotPathMatcher) -> Self {
        self.hot = hot;
        self
    }

    pub fn analyze_type(&self, layout: &TypeLayout) -> TypeReport {
        let padding_bytes = attributed_padding(layout);
        let used_bytes = layout.size.saturating_sub(padding_bytes);
        let padding_ratio = if layout.size == 0 {
            0.0
        } else {
            padding_bytes as f64 / layout.size as f64
        };

        let is_hot = self.hot.is_hot(&layout.name);
        let fit = CacheFit::compute(layout, used_bytes, self.line_size, is_hot);
        let reorder = reorder_candidate(layout);
        let reorderable = reorder.as_ref().is_some_and(|r| r.improves());

        TypeReport {
            name: layout.name.clone(),
            kind: layout.kind,
            size: layout.size,
            align: layout.align,
            used_bytes,
            padding_bytes,
            padding_ratio,
            reorderable,
            cache_unfriendly: fit.cache_unfriendly,
            is_packed: layout.is_packed,
            is_hot,
            excessive_padding: padding_ratio > self.padding_threshold,
            cache_lines_spanned: fit.lines_spanned,
            cache_line_density: fit.density,
            gaps: layout.gaps.clone(),
            unresolved_members: layout
                .members
                .iter()
                .filter(|m| m.is_unresolved())
                .map(|m| m.key())
                .collect(),
            reorder: reorder.filter(|r| r.improves()),
            false_sharing: analyze_false_sharing(layout, self.line_size),
        }
    }

    /// One report per type, in snapshot (name) order.
    pub fn analyze_snapshot(&self, snapshot: &Snapshot) -> Vec<TypeReport> {
        let layouts: Vec<&TypeLayout> = snapshot.iter().collect();
        let reports: Vec<TypeReport> = layouts.par_iter().map(|l| self.analyze_type(l)).collect();
        log::info!(
            "analyzed {} types: {} reorderable, {} cache-unfriendly",
            reports.len(),
            reports.iter().filter(|r| r.reorderable).count(),
            reports.iter().filter(|r| r.cache_unfriendly).count()
        );
        reports
    }
}
