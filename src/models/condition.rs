//! Card condition grades and their total order.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Physical condition grade of a card listing.
///
/// Grades form a total order used for threshold filtering: `Mint` is the
/// best, `Damaged` the worst known grade, and `Unknown` sorts below every
/// known grade so unparseable listings never pass a condition filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Mint,
    #[serde(rename = "Near Mint")]
    NearMint,
    #[serde(rename = "Lightly Played")]
    LightlyPlayed,
    #[serde(rename = "Moderately Played")]
    ModeratelyPlayed,
    #[serde(rename = "Heavily Played")]
    HeavilyPlayed,
    Damaged,
    Unknown,
}

/// Known grades with their canonical names, longest-match-first so that
/// "Lightly Played" is never shadowed by a shorter match like "Mint".
const VOCABULARY: &[(&str, Condition)] = &[
    ("moderately played", Condition::ModeratelyPlayed),
    ("lightly played", Condition::LightlyPlayed),
    ("heavily played", Condition::HeavilyPlayed),
    ("near mint", Condition::NearMint),
    ("damaged", Condition::Damaged),
    ("mint", Condition::Mint),
];

/// Grading abbreviations, matched as standalone tokens only.
const ABBREVIATIONS: &[(&str, Condition)] = &[
    ("NM", Condition::NearMint),
    ("LP", Condition::LightlyPlayed),
    ("MP", Condition::ModeratelyPlayed),
    ("HP", Condition::HeavilyPlayed),
    ("DMG", Condition::Damaged),
];

impl Condition {
    /// Numeric rank for ordering. Lower is better.
    pub fn rank(&self) -> u8 {
        match self {
            Condition::Mint => 0,
            Condition::NearMint => 1,
            Condition::LightlyPlayed => 2,
            Condition::ModeratelyPlayed => 3,
            Condition::HeavilyPlayed => 4,
            Condition::Damaged => 5,
            Condition::Unknown => 6,
        }
    }

    /// Whether this grade meets a minimum acceptable grade.
    ///
    /// "Lightly Played or better" accepts Mint through Lightly Played.
    /// `Unknown` never meets any threshold.
    pub fn at_least(&self, minimum: Condition) -> bool {
        *self != Condition::Unknown && self.rank() <= minimum.rank()
    }

    /// Canonical display name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Mint => "Mint",
            Condition::NearMint => "Near Mint",
            Condition::LightlyPlayed => "Lightly Played",
            Condition::ModeratelyPlayed => "Moderately Played",
            Condition::HeavilyPlayed => "Heavily Played",
            Condition::Damaged => "Damaged",
            Condition::Unknown => "Unknown",
        }
    }

    /// Extract a condition grade from free text.
    ///
    /// Case-insensitive substring match against the known vocabulary,
    /// longest-match-first, then grading abbreviations as whole tokens.
    /// Unmatched text maps to `Unknown`.
    pub fn parse(text: &str) -> Condition {
        let lowered = text.to_lowercase();
        for (name, condition) in VOCABULARY {
            if lowered.contains(name) {
                return *condition;
            }
        }

        for token in text.split_whitespace() {
            let token = token.trim_matches(|c: char| !c.is_ascii_alphanumeric());
            for (abbrev, condition) in ABBREVIATIONS {
                if token == *abbrev {
                    return *condition;
                }
            }
        }

        Condition::Unknown
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
