//! Reviewer trust classification.
//!
//! The server aggregates submitted jitter profiles into a per-reviewer
//! [`ReviewerProfile`]. This module maps that summary to the badge shown on
//! reviews and profiles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum consistency for a high-confidence reviewer to be trusted.
const TRUSTED_MIN_CONSISTENCY: f64 = 0.6;

/// Minimum consistency for a medium-confidence reviewer to be verified.
const VERIFIED_MIN_CONSISTENCY: f64 = 0.4;

/// How much typing history backs a reviewer's profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl std::str::FromStr for ConfidenceLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(ConfidenceLevel::Low),
            "medium" => Ok(ConfidenceLevel::Medium),
            "high" => Ok(ConfidenceLevel::High),
            other => Err(format!("unknown confidence level '{other}'")),
        }
    }
}

/// Server-side summary of a reviewer's keystroke history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewerProfile {
    pub confidence_level: ConfidenceLevel,
    /// Cross-review consistency in [0, 1]
    pub consistency_score: f64,
    pub review_count: u32,
    #[serde(default)]
    pub flagged: bool,
}

/// Trust indicator shown next to a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustBadge {
    /// High-confidence, consistent typing profile
    TrustedReviewer,
    /// Medium-confidence, consistent typing profile
    HumanVerified,
    /// Rating estimated from imported public reviews
    AiEstimated,
    /// New reviewer still building a profile
    Building,
}

impl TrustBadge {
    pub fn label(&self) -> &'static str {
        match self {
            TrustBadge::TrustedReviewer => "Trusted Reviewer",
            TrustBadge::HumanVerified => "Verified Human",
            TrustBadge::AiEstimated => "Estimated from public reviews",
            TrustBadge::Building => "Building verification...",
        }
    }
}

impl fmt::Display for TrustBadge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pick the badge for a reviewer, if any.
///
/// Flagged reviewers and reviewers without history get no badge.
pub fn classify(profile: Option<&ReviewerProfile>) -> Option<TrustBadge> {
    let profile = profile?;
    if profile.flagged {
        return None;
    }

    match profile.confidence_level {
        ConfidenceLevel::High if profile.consistency_score >= TRUSTED_MIN_CONSISTENCY => {
            Some(TrustBadge::TrustedReviewer)
        }
        ConfidenceLevel::Medium if profile.consistency_score >= VERIFIED_MIN_CONSISTENCY => {
            Some(TrustBadge::HumanVerified)
        }
        _ if profile.review_count > 0 => Some(TrustBadge::Building),
        _ => None,
    }
}

/// Review trust counts for a restaurant page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustSummary {
    pub verified: u32,
    pub ai_estimated: u32,
}

impl TrustSummary {
    /// Tally badges, counting trusted and verified reviewers as verified.
    pub fn from_badges<'a>(badges: impl IntoIterator<Item = &'a TrustBadge>) -> Self {
        badges
            .into_iter()
            .fold(Self::default(), |mut summary, badge| {
                match badge {
                    TrustBadge::TrustedReviewer | TrustBadge::HumanVerified => {
                        summary.verified += 1
                    }
                    TrustBadge::AiEstimated => summary.ai_estimated += 1,
                    TrustBadge::Building => {}
                }
                summary
            })
    }

    pub fn is_empty(&self) -> bool {
        self.verified == 0 && self.ai_estimated == 0
    }
}

impl fmt::Display for TrustSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.verified > 0 {
            parts.push(format!(
                "{} verified review{}",
                self.verified,
                if self.verified == 1 { "" } else { "s" }
            ));
        }
        if self.ai_estimated > 0 {
            parts.push(format!("{} AI-estimated", self.ai_estimated));
        }
        f.write_str(&parts.join(", "))
    }
}
