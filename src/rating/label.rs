//! Ordinal labels shown next to a game's score

use serde::{Deserialize, Serialize};

/// Five-step verdict derived from an average score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingLabel {
    VeryNegative,
    Negative,
    Mixed,
    Positive,
    VeryPositive,
}

/// Inclusive lower bounds, checked from the top down
const THRESHOLDS: [(f64, RatingLabel); 4] = [
    (4.5, RatingLabel::VeryPositive),
    (3.5, RatingLabel::Positive),
    (2.5, RatingLabel::Mixed),
    (1.5, RatingLabel::Negative),
];

/// Map an average score to its label. The first threshold the score reaches wins;
/// anything below 1.5 (including NaN) is `VeryNegative`.
pub fn classify_label(rating: f64) -> RatingLabel {
    THRESHOLDS
        .iter()
        .find(|(lower_bound, _)| rating >= *lower_bound)
        .map(|(_, label)| *label)
        .unwrap_or(RatingLabel::VeryNegative)
}

impl RatingLabel {
    /// All labels from best to worst
    pub const ALL: [RatingLabel; 5] = [
        RatingLabel::VeryPositive,
        RatingLabel::Positive,
        RatingLabel::Mixed,
        RatingLabel::Negative,
        RatingLabel::VeryNegative,
    ];

    /// Stable machine-readable key
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingLabel::VeryPositive => "very_positive",
            RatingLabel::Positive => "positive",
            RatingLabel::Mixed => "mixed",
            RatingLabel::Negative => "negative",
            RatingLabel::VeryNegative => "very_negative",
        }
    }

    /// Text shown on game pages
    pub fn display_name(&self) -> &'static str {
        match self {
            RatingLabel::VeryPositive => "매우 긍정적",
            RatingLabel::Positive => "긍정적",
            RatingLabel::Mixed => "복합적",
            RatingLabel::Negative => "부정적",
            RatingLabel::VeryNegative => "매우 부정적",
        }
    }
}

impl std::fmt::Display for RatingLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
