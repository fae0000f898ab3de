use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::parser::types::Tier;

/// The support team roster. Tier classification is configuration, not data:
/// the normalizer tags each agent/contributor row against these lists and
/// anything unrecognized becomes `Tier::Unknown`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRoster {
    /// Level 1 agents: initial triage and direct customer support.
    pub level1: Vec<String>,
    /// Level 2 contributors: escalated and engineering-adjacent issues.
    pub level2: Vec<String>,
}

impl TeamRoster {
    pub fn new(level1: Vec<String>, level2: Vec<String>) -> TeamRoster {
        TeamRoster { level1, level2 }
    }

    /// Case-insensitive match against both lists. Level 1 wins if a name
    /// somehow appears in both.
    pub fn classify(&self, name: &str) -> Tier {
        let needle = name.trim();
        if self
            .level1
            .iter()
            .any(|n| n.eq_ignore_ascii_case(needle))
        {
            Tier::Level1
        } else if self
            .level2
            .iter()
            .any(|n| n.eq_ignore_ascii_case(needle))
        {
            Tier::Level2
        } else {
            Tier::Unknown
        }
    }

    pub fn members_of(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Level1 => &self.level1,
            Tier::Level2 => &self.level2,
            Tier::Unknown => &[],
        }
    }
}

impl Default for TeamRoster {
    fn default() -> TeamRoster {
        TeamRoster {
            level1: vec![
                "Maya Lindqvist".into(),
                "Tomas Rivera".into(),
                "Priya Nair".into(),
                "Jonas Eriksen".into(),
                "Claire Dubois".into(),
            ],
            level2: vec!["Andrei Popescu".into(), "Sofia Almeida".into()],
        }
    }
}

/// Options for one analytics run. Constructed explicitly and passed into the
/// normalizer and assembler rather than read from any global.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub roster: TeamRoster,
    /// Customer Intelligence shows the top N organizations by ticket volume.
    /// `None` lists every organization. The weighted summary always covers
    /// all of them regardless of the cutoff.
    pub customer_cutoff: Option<usize>,
}

impl Default for AnalyticsConfig {
    fn default() -> AnalyticsConfig {
        AnalyticsConfig {
            roster: TeamRoster::default(),
            customer_cutoff: Some(10),
        }
    }
}

impl AnalyticsConfig {
    /// Load from an operator-maintained JSON file. Missing fields fall back
    /// to the versioned defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<AnalyticsConfig, Error> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_case_insensitive() {
        let roster = TeamRoster::default();
        assert_eq!(roster.classify("maya lindqvist"), Tier::Level1);
        assert_eq!(roster.classify("MAYA LINDQVIST"), Tier::Level1);
        assert_eq!(roster.classify("  Sofia Almeida "), Tier::Level2);
    }

    #[test]
    fn test_classify_unknown() {
        let roster = TeamRoster::default();
        assert_eq!(roster.classify("Nobody Inparticular"), Tier::Unknown);
        assert_eq!(roster.classify(""), Tier::Unknown);
    }

    #[test]
    fn test_default_roster_shape() {
        let roster = TeamRoster::default();
        assert_eq!(roster.level1.len(), 5);
        assert_eq!(roster.level2.len(), 2);
    }

    #[test]
    fn test_config_from_json_defaults() {
        let cfg: AnalyticsConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.customer_cutoff, Some(10));
        assert_eq!(cfg.roster.level1.len(), 5);
    }

    #[test]
    fn test_config_from_json_overrides() {
        let cfg: AnalyticsConfig = serde_json::from_str(
            r#"{"roster": {"level1": ["A"], "level2": ["B"]}, "customer_cutoff": null}"#,
        )
        .unwrap();
        assert_eq!(cfg.roster.level1, vec!["A".to_string()]);
        assert_eq!(cfg.customer_cutoff, None);
    }
}
