use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::AppError;

/// Number of leading transcript characters hashed into the record id.
const ID_PREFIX_CHARS: usize = 100;

/// Hex characters kept from the content hash.
const ID_HEX_LEN: usize = 12;

/// One persisted meeting: the transcript plus its three analysis documents
/// and metadata.
///
/// `summary`, `sentiment_analysis`, and `coach_feedback` are schema-less
/// documents owned by the analysis backend. The store persists them opaquely
/// and only reads a handful of well-known optional keys (`action_items`,
/// `decisions`, `key_points`, `effectiveness_score`, `overall_score`) for
/// indexing and reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingRecord {
    pub id: String,
    pub title: String,
    pub date: DateTime<Utc>,
    pub participants: Vec<String>,
    pub transcript: String,
    pub summary: Value,
    pub sentiment_analysis: Value,
    pub coach_feedback: Value,
    pub duration_minutes: Option<u32>,
    pub meeting_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Assigned by the storage engine at write time. Audit only — never used
    /// for ordering or uniqueness.
    pub created_at: Option<DateTime<Utc>>,
}

impl MeetingRecord {
    /// Validating constructor. `id`, `title`, and `transcript` must be
    /// non-empty; everything else is taken as given.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        title: String,
        date: DateTime<Utc>,
        participants: Vec<String>,
        transcript: String,
        summary: Value,
        sentiment_analysis: Value,
        coach_feedback: Value,
        duration_minutes: Option<u32>,
        meeting_type: Option<String>,
        tags: Vec<String>,
    ) -> Result<Self, AppError> {
        if id.trim().is_empty() {
            return Err(AppError::InvalidRecord("id must not be empty".into()));
        }
        if title.trim().is_empty() {
            return Err(AppError::InvalidRecord("title must not be empty".into()));
        }
        if transcript.is_empty() {
            return Err(AppError::InvalidRecord(
                "transcript must not be empty".into(),
            ));
        }

        Ok(Self {
            id,
            title,
            date,
            participants,
            transcript,
            summary,
            sentiment_analysis,
            coach_feedback,
            duration_minutes,
            meeting_type,
            tags,
            created_at: None,
        })
    }

    /// Record factory: build an unpersisted record from raw analysis output.
    ///
    /// Stamps `date` as "now", derives the id from the transcript prefix and
    /// that timestamp, and fills optional fields with their defaults. The
    /// caller hands the result to [`MeetingHistory::store`].
    ///
    /// [`MeetingHistory::store`]: crate::history::MeetingHistory::store
    #[allow(clippy::too_many_arguments)]
    pub fn from_analysis(
        title: &str,
        transcript: &str,
        participants: Vec<String>,
        summary: Value,
        sentiment_analysis: Value,
        coach_feedback: Value,
        meeting_type: Option<String>,
        tags: Option<Vec<String>>,
    ) -> Result<Self, AppError> {
        let date = Utc::now();
        let id = derive_meeting_id(transcript, date);
        Self::new(
            id,
            title.to_string(),
            date,
            participants,
            transcript.to_string(),
            summary,
            sentiment_analysis,
            coach_feedback,
            None,
            meeting_type,
            tags.unwrap_or_default(),
        )
    }
}

/// Derive a stable meeting id from content and date.
///
/// Hashes the first 100 characters of the transcript concatenated with the
/// RFC 3339 timestamp and keeps 12 hex characters. Deterministic by design:
/// re-storing the same transcript at the same instant yields the same id and
/// overwrites the prior record. Casual uniqueness only — not suitable where
/// collisions matter.
pub fn derive_meeting_id(transcript: &str, date: DateTime<Utc>) -> String {
    let prefix: String = transcript.chars().take(ID_PREFIX_CHARS).collect();
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(date.to_rfc3339().as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)[..ID_HEX_LEN].to_string()
}
