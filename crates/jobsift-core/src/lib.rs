//! Core domain model for the jobsift pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const CRATE_NAME: &str = "jobsift-core";

/// Identity of a posting across runs: the board's native job id (or a
/// deterministic composite when the board supplies none) plus the board id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostingKey {
    pub job_id: String,
    pub board_id: String,
}

impl PostingKey {
    pub fn new(job_id: impl Into<String>, board_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            board_id: board_id.into(),
        }
    }
}

/// Canonical persisted job record. Core attributes are written once by the
/// insert stage; annotation stages only ever fill their own columns on the
/// existing row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub key: PostingKey,
    pub title: String,
    pub location: String,
    pub department: String,
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
    pub description: String,
}

/// Title-relevance gate verdict, stored as `'TRUE'` / `'FALSE'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TitleVerdict {
    Relevant,
    Rejected,
}

impl TitleVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            TitleVerdict::Relevant => "TRUE",
            TitleVerdict::Rejected => "FALSE",
        }
    }
}

/// Location classification label, stored as `'Yes'` / `'No'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsaLabel {
    Yes,
    No,
}

impl UsaLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            UsaLabel::Yes => "Yes",
            UsaLabel::No => "No",
        }
    }

    /// Permissive read of a free-text model answer: anything that starts
    /// with "yes" counts as Yes, everything else as No.
    pub fn from_answer(answer: &str) -> Self {
        if answer.trim().to_lowercase().starts_with("yes") {
            UsaLabel::Yes
        } else {
            UsaLabel::No
        }
    }
}

/// Visa eligibility verdict attached alongside the fit score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisaVerdict {
    Yes,
    No,
}

impl VisaVerdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            VisaVerdict::Yes => "Yes",
            VisaVerdict::No => "No",
        }
    }

    /// Strict vocabulary check; callers fall back to the permissive
    /// default when this returns None.
    pub fn from_word(word: &str) -> Option<Self> {
        match word.trim().to_lowercase().as_str() {
            "yes" => Some(VisaVerdict::Yes),
            "no" => Some(VisaVerdict::No),
            _ => None,
        }
    }
}

/// Output of the fit-scoring stage for one posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub score: i32,
    pub visa: VisaVerdict,
    pub reason: String,
}

/// Row projection selected by the title-filter stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleCandidate {
    pub key: PostingKey,
    pub title: String,
    pub description: String,
}

/// Row projection selected by the location-classification stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCandidate {
    pub key: PostingKey,
    pub location: String,
}

/// Row projection selected by the fit-scoring stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitCandidate {
    pub key: PostingKey,
    pub title: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usa_label_reads_model_answers_permissively() {
        assert_eq!(UsaLabel::from_answer("Yes"), UsaLabel::Yes);
        assert_eq!(UsaLabel::from_answer("  yes."), UsaLabel::Yes);
        assert_eq!(UsaLabel::from_answer("YES, remote eligible"), UsaLabel::Yes);
        assert_eq!(UsaLabel::from_answer("No"), UsaLabel::No);
        assert_eq!(UsaLabel::from_answer("maybe"), UsaLabel::No);
        assert_eq!(UsaLabel::from_answer(""), UsaLabel::No);
    }

    #[test]
    fn visa_verdict_rejects_anything_outside_vocabulary() {
        assert_eq!(VisaVerdict::from_word("Yes"), Some(VisaVerdict::Yes));
        assert_eq!(VisaVerdict::from_word(" no "), Some(VisaVerdict::No));
        assert_eq!(VisaVerdict::from_word("probably"), None);
        assert_eq!(VisaVerdict::from_word(""), None);
    }

    #[test]
    fn verdicts_render_their_column_values() {
        assert_eq!(TitleVerdict::Relevant.as_str(), "TRUE");
        assert_eq!(TitleVerdict::Rejected.as_str(), "FALSE");
        assert_eq!(UsaLabel::Yes.as_str(), "Yes");
        assert_eq!(VisaVerdict::No.as_str(), "No");
    }
}
