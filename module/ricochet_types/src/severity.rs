//! Severity derivation from a free-form context tag.

use serde::{Deserialize, Serialize};

/// Severity of a [`crate::Finding`], derived purely from the injection's context tag.
///
/// Never stored — always computed, so the same context always yields the same
/// severity across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Context contains neither `ssti`/`sqli` nor `xss`.
    Info,
    /// Context contains `xss`.
    Medium,
    /// Context contains `ssti` or `sqli`.
    High,
}

impl Severity {
    /// Derives severity from a free-form context tag:
    /// `ssti`/`sqli` → `high`, `xss` → `medium`, otherwise → `info`.
    #[must_use]
    pub fn from_context(context: &str) -> Self {
        let lower = context.to_ascii_lowercase();
        if lower.contains("ssti") || lower.contains("sqli") {
            Self::High
        } else if lower.contains("xss") {
            Self::Medium
        } else {
            Self::Info
        }
    }

    /// Parses a severity name as used on the `findings --min-severity` CLI flag.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "info" => Some(Self::Info),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Lowercase name as rendered in JSONL output and reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqli_and_ssti_are_high() {
        assert_eq!(Severity::from_context("sqli:mssql"), Severity::High);
        assert_eq!(Severity::from_context("ssti:jinja2"), Severity::High);
    }

    #[test]
    fn xss_is_medium() {
        assert_eq!(Severity::from_context("xss:html"), Severity::Medium);
    }

    #[test]
    fn unknown_context_is_info() {
        assert_eq!(Severity::from_context("probe"), Severity::Info);
        assert_eq!(Severity::from_context(""), Severity::Info);
    }

    #[test]
    fn derivation_is_a_pure_function_of_context() {
        // Same context, repeated calls, must agree (testable property #9).
        for _ in 0..5 {
            assert_eq!(Severity::from_context("sqli:postgres"), Severity::High);
        }
    }

    #[test]
    fn ordering_matches_severity_scale() {
        assert!(Severity::Info < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
    }

    #[test]
    fn parse_round_trips_as_str() {
        for s in [Severity::Info, Severity::Medium, Severity::High] {
            assert_eq!(Severity::parse(s.as_str()), Some(s));
        }
        assert_eq!(Severity::parse("bogus"), None);
    }
}
