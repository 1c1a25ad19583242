//! Meeting transcript history and team analytics.
//!
//! The flow: an analysis backend (see [`analysis`]) turns a raw transcript
//! into summary, sentiment, and coaching documents; the record factory
//! ([`record::MeetingRecord::from_analysis`]) assembles them into a
//! [`record::MeetingRecord`]; [`history::MeetingHistory`] persists it in
//! SQLite alongside an FTS5 index; [`analytics::MeetingAnalytics`] derives
//! windowed sentiment-trend and team-performance reports from what's stored.
//!
//! Storage operations never raise — they log failures and return safe
//! defaults (`false`, `None`, empty). Analytics return explicit no-data
//! results rather than zero-filled reports.

pub mod analysis;
pub mod analytics;
pub mod config;
pub mod error;
pub mod history;
pub mod record;

pub use analysis::{build_analyzer, ChatTurn, TranscriptAnalyzer};
pub use analytics::{MeetingAnalytics, PerformanceReport, SentimentTrend};
pub use config::{AnalyzerConfig, AnalyzerMode, AppConfig};
pub use error::AppError;
pub use history::MeetingHistory;
pub use record::{derive_meeting_id, MeetingRecord};
