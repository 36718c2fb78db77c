//! Vote submission payloads.
//!
//! A submission bundles a dish vote with the optional review text and the
//! keystroke signals captured while it was typed. Signals are captured only
//! when review text is present, and must be taken before the tracker is
//! reset for the next composition.

use crate::core::{JitterProfile, KeystrokeSignatureTracker, PuritySnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Longest accepted review, in UTF-16 units.
pub const MAX_REVIEW_LENGTH: usize = 200;

/// Accepted rating range on the 10-point scale.
pub const RATING_RANGE: std::ops::RangeInclusive<f64> = 0.0..=10.0;

/// The name of this producer.
pub const PRODUCER_NAME: &str = "purity-tracker";

/// Errors raised while building a submission.
#[derive(Debug, Error, PartialEq)]
pub enum SubmissionError {
    #[error("Missing dish id")]
    MissingDish,

    #[error("Missing rating")]
    MissingRating,

    #[error("Rating {0} is outside 0-10")]
    RatingOutOfRange(f64),

    #[error("{0} characters over limit")]
    ReviewTooLong(usize),
}

/// Producer metadata attached to every submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Producer {
    pub name: String,
    pub version: String,
}

impl Default for Producer {
    fn default() -> Self {
        Self {
            name: PRODUCER_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A dish vote ready to forward to the vote endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub id: Uuid,
    pub dish_id: String,
    pub would_order_again: bool,
    pub rating_10: f64,
    pub review_text: Option<String>,
    pub purity: Option<PuritySnapshot>,
    pub jitter_profile: Option<JitterProfile>,
    pub created_at: DateTime<Utc>,
    pub producer: Producer,
}

impl ReviewSubmission {
    pub fn has_review(&self) -> bool {
        self.review_text.is_some()
    }
}

/// Builder for [`ReviewSubmission`].
#[derive(Debug, Clone, Default)]
pub struct SubmissionBuilder {
    dish_id: String,
    would_order_again: bool,
    rating: Option<f64>,
    review: Option<String>,
}

impl SubmissionBuilder {
    pub fn new(dish_id: impl Into<String>) -> Self {
        Self {
            dish_id: dish_id.into(),
            ..Self::default()
        }
    }

    pub fn would_order_again(mut self, yes: bool) -> Self {
        self.would_order_again = yes;
        self
    }

    pub fn rating(mut self, rating_10: f64) -> Self {
        self.rating = Some(rating_10);
        self
    }

    pub fn review(mut self, text: impl Into<String>) -> Self {
        self.review = Some(text.into());
        self
    }

    /// Validate and build, reading keystroke signals from `tracker`.
    ///
    /// The tracker is only read. Whitespace-only reviews count as no review
    /// and carry no signals.
    pub fn build(
        self,
        tracker: &KeystrokeSignatureTracker,
    ) -> Result<ReviewSubmission, SubmissionError> {
        if self.dish_id.trim().is_empty() {
            return Err(SubmissionError::MissingDish);
        }

        let rating = self.rating.ok_or(SubmissionError::MissingRating)?;
        if !rating.is_finite() || !RATING_RANGE.contains(&rating) {
            return Err(SubmissionError::RatingOutOfRange(rating));
        }

        if let Some(text) = &self.review {
            let len = text.encode_utf16().count();
            if len > MAX_REVIEW_LENGTH {
                return Err(SubmissionError::ReviewTooLong(len - MAX_REVIEW_LENGTH));
            }
        }

        let review_text = self
            .review
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        let (purity, jitter_profile) = if review_text.is_some() {
            (Some(tracker.purity()), tracker.jitter_profile())
        } else {
            (None, None)
        };

        Ok(ReviewSubmission {
            id: Uuid::new_v4(),
            dish_id: self.dish_id,
            would_order_again: self.would_order_again,
            rating_10: rating,
            review_text,
            purity,
            jitter_profile,
            created_at: Utc::now(),
            producer: Producer::default(),
        })
    }
}
