//! Windowed, read-only reports derived from stored meeting records.
//!
//! Both reports fetch a date-bounded snapshot from the store and aggregate
//! over it; nothing persists between calls. Empty-data conditions are
//! explicit results, not errors.

use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::history::MeetingHistory;
use crate::record::MeetingRecord;

/// Default trailing window for both reports.
pub const DEFAULT_WINDOW_DAYS: i64 = 30;

/// Binary trend classification: the last-fetched score against the first.
/// No "flat" state by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub date: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentTrendReport {
    pub period_days: i64,
    pub meetings_analyzed: usize,
    pub average_sentiment: f64,
    pub trend: TrendDirection,
    /// Timeline points in fetch order — meeting date descending, matching
    /// the store's range query.
    pub sentiment_timeline: Vec<TimelinePoint>,
    pub highest_sentiment: f64,
    pub lowest_sentiment: f64,
}

/// Outcome of a sentiment-trend query. The no-data cases are distinct
/// results callers branch on, never zero-filled reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SentimentTrend {
    NoMeetings {
        period_days: i64,
    },
    NoSentimentData {
        period_days: i64,
        meetings_analyzed: usize,
    },
    Trend(SentimentTrendReport),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantActivity {
    pub name: String,
    pub meetings: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingTypeCount {
    pub meeting_type: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamPerformanceReport {
    pub report_period: String,
    pub period_days: i64,
    pub total_meetings: usize,
    pub total_action_items: usize,
    pub total_decisions: usize,
    /// Mean of `coach_feedback.effectiveness_score` over **all** meetings in
    /// the window; meetings without the key dilute the average toward zero.
    pub average_effectiveness_score: f64,
    pub action_items_per_meeting: f64,
    pub decisions_per_meeting: f64,
    /// Five most frequent participants; ties keep first-appearance order.
    pub most_active_participants: Vec<ParticipantActivity>,
    pub meeting_types_distribution: Vec<MeetingTypeCount>,
    pub sentiment_trends: SentimentTrend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PerformanceReport {
    NoMeetings { period_days: i64 },
    Report(TeamPerformanceReport),
}

/// Derives team reports from a [`MeetingHistory`] snapshot.
pub struct MeetingAnalytics {
    history: MeetingHistory,
}

impl MeetingAnalytics {
    pub fn new(history: MeetingHistory) -> Self {
        Self { history }
    }

    /// Sentiment trend over the trailing window (`days` back from now,
    /// default 30).
    pub fn sentiment_trend(&self, days: Option<i64>) -> SentimentTrend {
        let days = days.unwrap_or(DEFAULT_WINDOW_DAYS);
        let end = Utc::now();
        let start = end - Duration::days(days);
        let meetings = self.history.by_date_range(start, end);
        build_sentiment_trend(days, &meetings)
    }

    /// Team performance report over the same trailing window, including an
    /// embedded sentiment trend (recomputed with its own fetch).
    pub fn performance_report(&self, days: Option<i64>) -> PerformanceReport {
        let days = days.unwrap_or(DEFAULT_WINDOW_DAYS);
        let end = Utc::now();
        let start = end - Duration::days(days);
        let meetings = self.history.by_date_range(start, end);

        if meetings.is_empty() {
            return PerformanceReport::NoMeetings { period_days: days };
        }

        let total_meetings = meetings.len();
        let mut total_action_items = 0usize;
        let mut total_decisions = 0usize;
        let mut effectiveness_sum = 0.0f64;
        let mut participant_frequency: Vec<(String, usize)> = Vec::new();
        let mut meeting_types: Vec<(String, usize)> = Vec::new();

        for meeting in &meetings {
            total_action_items += doc_list_len(&meeting.summary, "action_items");
            total_decisions += doc_list_len(&meeting.summary, "decisions");

            if let Some(score) = meeting
                .coach_feedback
                .get("effectiveness_score")
                .and_then(Value::as_f64)
            {
                effectiveness_sum += score;
            }

            for participant in &meeting.participants {
                bump(&mut participant_frequency, participant);
            }

            if let Some(meeting_type) = &meeting.meeting_type {
                bump(&mut meeting_types, meeting_type);
            }
        }

        // Divided by the total meeting count, not the count of meetings
        // that carried a score.
        let average_effectiveness = effectiveness_sum / total_meetings as f64;

        let mut most_active = participant_frequency;
        // Stable sort: ties keep first-appearance order.
        most_active.sort_by(|a, b| b.1.cmp(&a.1));
        most_active.truncate(5);

        PerformanceReport::Report(TeamPerformanceReport {
            report_period: format!(
                "{} to {}",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            ),
            period_days: days,
            total_meetings,
            total_action_items,
            total_decisions,
            average_effectiveness_score: round2(average_effectiveness),
            action_items_per_meeting: round1(total_action_items as f64 / total_meetings as f64),
            decisions_per_meeting: round1(total_decisions as f64 / total_meetings as f64),
            most_active_participants: most_active
                .into_iter()
                .map(|(name, meetings)| ParticipantActivity { name, meetings })
                .collect(),
            meeting_types_distribution: meeting_types
                .into_iter()
                .map(|(meeting_type, count)| MeetingTypeCount { meeting_type, count })
                .collect(),
            sentiment_trends: self.sentiment_trend(Some(days)),
        })
    }
}

fn build_sentiment_trend(days: i64, meetings: &[MeetingRecord]) -> SentimentTrend {
    if meetings.is_empty() {
        return SentimentTrend::NoMeetings { period_days: days };
    }

    // Records without a numeric overall_score are skipped, not zeroed.
    let timeline: Vec<TimelinePoint> = meetings
        .iter()
        .filter_map(|meeting| {
            meeting
                .sentiment_analysis
                .get("overall_score")
                .and_then(Value::as_f64)
                .map(|score| TimelinePoint {
                    date: meeting.date.format("%Y-%m-%d").to_string(),
                    score,
                })
        })
        .collect();

    if timeline.is_empty() {
        return SentimentTrend::NoSentimentData {
            period_days: days,
            meetings_analyzed: meetings.len(),
        };
    }

    let scores: Vec<f64> = timeline.iter().map(|p| p.score).collect();
    let average = scores.iter().sum::<f64>() / scores.len() as f64;
    let trend = if scores.len() > 1 && scores[scores.len() - 1] > scores[0] {
        TrendDirection::Improving
    } else {
        TrendDirection::Declining
    };
    let highest = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let lowest = scores.iter().cloned().fold(f64::INFINITY, f64::min);

    SentimentTrend::Trend(SentimentTrendReport {
        period_days: days,
        meetings_analyzed: meetings.len(),
        average_sentiment: round2(average),
        trend,
        sentiment_timeline: timeline,
        highest_sentiment: highest,
        lowest_sentiment: lowest,
    })
}

/// Length of a list under `key`, or 0 when absent or not a list.
fn doc_list_len(doc: &Value, key: &str) -> usize {
    doc.get(key).and_then(Value::as_array).map_or(0, Vec::len)
}

/// Increment a count in an insertion-ordered frequency list.
fn bump(counts: &mut Vec<(String, usize)>, key: &str) {
    match counts.iter_mut().find(|(k, _)| k == key) {
        Some((_, n)) => *n += 1,
        None => counts.push((key.to_string(), 1)),
    }
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}
