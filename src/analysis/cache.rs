// Mon Oct 19 2026 - Alex

use crate::error::{AuditError, Result};
use crate::structure::TypeLayout;
use regex::RegexSet;
use serde::{Deserialize, Serialize};

/// Decides which types are tagged hot from glob patterns over qualified names.
#[derive(Debug, Clone)]
pub struct HotPathMatcher {
    patterns: Vec<String>,
    set: RegexSet,
}

impl HotPathMatcher {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut regexes = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                return Err(AuditError::Config("empty hot path tag".to_string()));
            }
            regexes.push(glob_to_regex(pattern));
        }
        let set = RegexSet::new(&regexes).map_err(|e| AuditError::Config(format!("hot path tag: {}", e)))?;

        Ok(Self {
            patterns: patterns.iter().map(|p| p.as_ref().trim().to_string()).collect(),
            set,
        })
    }

    /// Matcher that tags nothing.
    pub fn none() -> Self {
        Self {
            patterns: Vec::new(),
            set: RegexSet::empty(),
        }
    }

    pub fn is_hot(&self, type_name: &str) -> bool {
        self.set.is_match(type_name)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for HotPathMatcher {
    fn default() -> Self {
        Self::none()
    }
}

pub(crate) fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() * 2 + 2);
    out.push('^');
    for c in glob.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    out.push('$');
    out
}

/// How a type sits relative to cache lines, assuming instances start line-aligned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheFit {
    pub line_size: u64,
    pub lines_spanned: u64,
    /// Used bytes over the bytes of every line the type touches.
    pub density: f64,
    pub cache_unfriendly: bool,
}

impl CacheFit {
    pub fn compute(layout: &TypeLayout, used_bytes: u64, line_size: u64, hot: bool) -> Self {
        let line_size = line_size.max(1);
        let lines_spanned = layout.size.div_ceil(line_size);
        let density = if lines_spanned == 0 {
            0.0
        } else {
            used_bytes as f64 / (lines_spanned as f64 * line_size as f64)
        };
        Self {
            line_size,
            lines_spanned,
            density,
            cache_unfriendly: hot && straddles_lines(layout.size, layout.align, line_size),
        }
    }
}

/// Whether instances of this size and alignment end up crossing line boundaries
/// when laid out back to back or placed at their natural alignment.
///
/// A type no larger than a line must divide the line evenly; a larger one must
/// be a whole number of lines and line-aligned.
pub fn straddles_lines(size: u64, align: u64, line_size: u64) -> bool {
    if size == 0 || line_size == 0 {
        return false;
    }
    if size <= line_size {
        line_size % size != 0
    } else {
        size % line_size != 0 || align < line_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structure::{Member, TypeKind};

    #[test]
    fn test_glob_matching() {
        let matcher = HotPathMatcher::new(&["net::*", "Hot?rder"]).unwrap();
        assert!(matcher.is_hot("net::Packet"));
        assert!(matcher.is_hot("HotOrder"));
        assert!(!matcher.is_hot("HotOOrder"));
        assert!(!matcher.is_hot("app::net::Packet"));
        assert!(!HotPathMatcher::none().is_hot("anything"));
    }

    #[test]
    fn test_metacharacters_are_literal() {
        let matcher = HotPathMatcher::new(&["Box<int>"]).unwrap();
        assert!(matcher.is_hot("Box<int>"));
        let matcher = HotPathMatcher::new(&["a.b"]).unwrap();
        assert!(!matcher.is_hot("axb"));
    }

    #[test]
    fn test_straddles_lines() {
        assert!(!straddles_lines(64, 8, 64));
        assert!(!straddles_lines(16, 8, 64));
        assert!(straddles_lines(24, 8, 64));
        assert!(straddles_lines(72, 8, 64));
        assert!(straddles_lines(128, 8, 64));
        assert!(!straddles_lines(128, 64, 64));
    }

    #[test]
    fn test_fit_metrics() {
        let layout = TypeLayout::new(
            "HotOrder",
            TypeKind::Struct,
            64,
            8,
            (0..8).map(|i| Member::primitive(&format!("f{}", i), "long", i * 8, 8)).collect(),
        );
        let fit = CacheFit::compute(&layout, 64, 64, true);
        assert_eq!(fit.lines_spanned, 1);
        assert_eq!(fit.density, 1.0);
        assert!(!fit.cache_unfriendly);

        let fit = CacheFit::compute(&layout, 64, 32, true);
        assert_eq!(fit.lines_spanned, 2);
        assert!(fit.cache_unfriendly);
        assert!(!CacheFit::compute(&layout, 64, 32, false).cache_unfriendly);
    }

    #[test]
    fn test_fit_of_huge_type() {
        let layout = TypeLayout::new("Huge", TypeKind::Struct, u64::MAX, 1, Vec::new());
        let fit = CacheFit::compute(&layout, 0, 64, true);
        assert_eq!(fit.lines_spanned, u64::MAX.div_ceil(64));
        assert_eq!(fit.density, 0.0);
        assert!(fit.cache_unfriendly);
    }
}
