//! Keyword-based risk classification of free-text warnings
//!
//! The rules form an ordered list: the first rule that matches any warning
//! decides the grade. Reordering the list changes the classification of
//! warnings that hit several categories, so the order is part of the contract.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{RiskGrade, RiskLevel};

/// Where a location-sensitive rule looks for its keywords
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "names", rename_all = "snake_case")]
pub enum KeywordScope {
    /// Any matching warning counts (trip context)
    #[default]
    AnyLocation,
    /// Scoped rules only count warnings that also name one of these places
    Location(Vec<String>),
}

impl KeywordScope {
    /// `warning` must already be lowercased; place names are folded here
    fn admits(&self, warning: &str) -> bool {
        match self {
            KeywordScope::AnyLocation => true,
            KeywordScope::Location(names) => names
                .iter()
                .any(|n| warning.contains(n.to_lowercase().as_str())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeywordCategory {
    Cancellation,
    Storm,
    Delay,
    WindOrRain,
}

/// One entry of the priority chain
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeywordRule {
    pub category: KeywordCategory,
    /// Lowercase keywords, matched as substrings of the lowercased warning
    pub keywords: &'static [&'static str],
    /// Whether a `KeywordScope::Location` restricts this rule
    pub scoped: bool,
    pub level: RiskLevel,
    pub reason: &'static str,
}

impl KeywordRule {
    /// Whether `warning` (already lowercased) satisfies this rule under `scope`
    #[must_use]
    pub fn matches(&self, warning: &str, scope: &KeywordScope) -> bool {
        self.keywords.iter().any(|k| warning.contains(k)) && (!self.scoped || scope.admits(warning))
    }
}

pub const CANCELLATION_KEYWORDS: &[&str] = &["停飛", "取消", "cancel", "grounded"];
pub const STORM_KEYWORDS: &[&str] = &["颱風", "typhoon", "tropical storm"];
pub const DELAY_KEYWORDS: &[&str] = &["延誤", "delay"];
pub const WIND_RAIN_KEYWORDS: &[&str] = &[
    "強風",
    "暴風",
    "豪雨",
    "大雨",
    "gale",
    "strong wind",
    "heavy rain",
];

/// The default priority chain, highest priority first
pub const DEFAULT_RULES: [KeywordRule; 4] = [
    KeywordRule {
        category: KeywordCategory::Cancellation,
        keywords: CANCELLATION_KEYWORDS,
        scoped: false,
        level: RiskLevel::High,
        reason: "flight grounded/cancelled",
    },
    KeywordRule {
        category: KeywordCategory::Storm,
        keywords: STORM_KEYWORDS,
        scoped: true,
        level: RiskLevel::High,
        reason: "typhoon warning in effect, consider rescheduling",
    },
    KeywordRule {
        category: KeywordCategory::Delay,
        keywords: DELAY_KEYWORDS,
        scoped: false,
        level: RiskLevel::Medium,
        reason: "delays reported",
    },
    KeywordRule {
        category: KeywordCategory::WindOrRain,
        keywords: WIND_RAIN_KEYWORDS,
        scoped: true,
        level: RiskLevel::Medium,
        reason: "gale or heavy rain warning, monitor closely",
    },
];

/// Keyword classifier for one target's context. Never yields `LowMedium` or `Extreme`.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<KeywordRule>,
    scope: KeywordScope,
}

impl KeywordClassifier {
    #[must_use]
    pub fn new(scope: KeywordScope) -> Self {
        Self {
            rules: DEFAULT_RULES.to_vec(),
            scope,
        }
    }

    #[must_use]
    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    #[must_use]
    pub fn classify(&self, warnings: &[String]) -> RiskGrade {
        if warnings.is_empty() {
            return RiskGrade::with_reason(RiskLevel::Low, "no active warnings");
        }

        let lowered: Vec<String> = warnings.iter().map(|w| w.to_lowercase()).collect();

        for rule in &self.rules {
            if let Some(index) = lowered.iter().position(|w| rule.matches(w, &self.scope)) {
                debug!(category = ?rule.category, warning = %warnings[index], "keyword rule matched");
                let mut grade = RiskGrade::with_reason(rule.level, rule.reason);
                grade.details.push(warnings[index].clone());
                return grade;
            }
        }

        // Unclassified warnings are never treated as low risk
        RiskGrade::with_reason(RiskLevel::Medium, "warnings in effect, keep monitoring")
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(KeywordScope::AnyLocation)
    }
}
