//! Reviews of titles and comments on reviews.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::catalog::TitleId;
use crate::domain::users::UserId;
use crate::error::{DomainError, Result};

pub type ReviewId = i64;
pub type CommentId = i64;

const TEXT_MAX_LEN: usize = 256;

/// Review score, an integer in `1..=10`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "i32", into = "i32")]
pub struct Score(i32);

impl Score {
    pub const MIN: i32 = 1;
    pub const MAX: i32 = 10;

    pub fn new(value: i32) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(DomainError::validation(format!(
                "score must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> i32 {
        self.0
    }
}

impl TryFrom<i32> for Score {
    type Error = DomainError;

    fn try_from(value: i32) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Score> for i32 {
    fn from(value: Score) -> Self {
        value.0
    }
}

/// Arithmetic mean of the scores, `None` when there are none.
pub fn average_rating<I>(scores: I) -> Option<f64>
where
    I: IntoIterator<Item = Score>,
{
    let (sum, count) = scores
        .into_iter()
        .fold((0i64, 0u32), |(sum, count), score| {
            (sum + i64::from(score.value()), count + 1)
        });

    (count > 0).then(|| sum as f64 / f64::from(count))
}

fn validate_text(text: &str, required: bool) -> Result<()> {
    if required && text.trim().is_empty() {
        return Err(DomainError::validation("text is required"));
    }
    if text.chars().count() > TEXT_MAX_LEN {
        return Err(DomainError::validation(format!(
            "text too long: maximum {TEXT_MAX_LEN} characters allowed"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub id: ReviewId,
    /// Author username
    pub author: String,
    pub title: TitleId,
    pub text: Option<String>,
    pub score: Score,
    pub pub_date: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub author_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewDraft {
    #[serde(default)]
    pub text: Option<String>,
    pub score: Score,
}

impl ReviewDraft {
    pub fn validate(&self) -> Result<()> {
        if let Some(text) = &self.text {
            validate_text(text, false)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
    pub text: Option<String>,
    pub score: Option<Score>,
}

impl ReviewPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(text) = &self.text {
            validate_text(text, false)?;
        }
        Ok(())
    }
}

impl From<ReviewDraft> for ReviewPatch {
    fn from(draft: ReviewDraft) -> Self {
        Self {
            text: draft.text,
            score: Some(draft.score),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: CommentId,
    /// Author username
    pub author: String,
    pub review: ReviewId,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub author_id: UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommentDraft {
    pub text: String,
}

impl CommentDraft {
    pub fn validate(&self) -> Result<()> {
        validate_text(&self.text, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: &[i32]) -> Vec<Score> {
        values.iter().map(|v| Score::new(*v).unwrap()).collect()
    }

    #[test]
    fn score_bounds() {
        assert!(Score::new(1).is_ok());
        assert!(Score::new(10).is_ok());
        assert!(Score::new(0).is_err());
        assert!(Score::new(11).is_err());

        let parsed: std::result::Result<Score, _> = serde_json::from_str("42");
        assert!(parsed.is_err());
    }

    #[test]
    fn rating_is_mean_of_scores() {
        assert_eq!(average_rating(scores(&[8, 10])), Some(9.0));
        assert_eq!(average_rating(scores(&[7, 8])), Some(7.5));
        assert_eq!(average_rating(scores(&[3])), Some(3.0));
    }

    #[test]
    fn rating_is_absent_without_reviews() {
        assert_eq!(average_rating(Vec::new()), None);
    }

    #[test]
    fn comment_text_required() {
        assert!(CommentDraft { text: "  ".into() }.validate().is_err());
        assert!(CommentDraft { text: "nice".into() }.validate().is_ok());
        assert!(
            CommentDraft {
                text: "x".repeat(257)
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn review_text_optional() {
        let draft: ReviewDraft =
            serde_json::from_value(serde_json::json!({ "score": 5 })).unwrap();
        assert!(draft.validate().is_ok());
        assert!(draft.text.is_none());
    }
}
