//! Risk levels and the graded result handed to report consumers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered risk severity, `Low < LowMedium < Medium < High < Extreme`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    LowMedium,
    Medium,
    High,
    Extreme,
}

impl RiskLevel {
    /// Next level up, saturating at `Extreme`
    #[must_use]
    pub fn escalate(self) -> Self {
        match self {
            RiskLevel::Low => RiskLevel::LowMedium,
            RiskLevel::LowMedium => RiskLevel::Medium,
            RiskLevel::Medium => RiskLevel::High,
            RiskLevel::High | RiskLevel::Extreme => RiskLevel::Extreme,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low risk",
            RiskLevel::LowMedium => "Low-medium risk",
            RiskLevel::Medium => "Medium risk",
            RiskLevel::High => "High risk",
            RiskLevel::Extreme => "Extreme risk",
        }
    }

    /// Status light used in console and chat summaries
    #[must_use]
    pub fn indicator(self) -> &'static str {
        match self {
            RiskLevel::Low => "🟢",
            RiskLevel::LowMedium => "🟡",
            RiskLevel::Medium => "🟠",
            RiskLevel::High => "🔴",
            RiskLevel::Extreme => "🟣",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A risk level with its reason and the trail of details that produced it.
/// Built fresh on every evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskGrade {
    pub level: RiskLevel,
    /// Short reason shown next to the level, e.g. "flight grounded/cancelled"
    pub reason: Option<String>,
    pub details: Vec<String>,
}

impl RiskGrade {
    #[must_use]
    pub fn new(level: RiskLevel) -> Self {
        Self {
            level,
            reason: None,
            details: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_reason(level: RiskLevel, reason: impl Into<String>) -> Self {
        Self {
            level,
            reason: Some(reason.into()),
            details: Vec::new(),
        }
    }

    /// Human-readable label, e.g. "High risk - flight grounded/cancelled"
    #[must_use]
    pub fn label(&self) -> String {
        match &self.reason {
            Some(reason) => format!("{} - {}", self.level.label(), reason),
            None => self.level.label().to_string(),
        }
    }
}

impl fmt::Display for RiskGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())?;
        for detail in &self.details {
            write!(f, "\n   {detail}")?;
        }
        Ok(())
    }
}
