// Storage engine tests. Run with: cargo test history::tests

use crate::history::{MeetingHistory, DEFAULT_RECENT_LIMIT};
use crate::record::MeetingRecord;
use chrono::{DateTime, Utc};
use serde_json::json;
use tempfile::TempDir;

fn setup_test_db() -> (MeetingHistory, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let history = MeetingHistory::new(&db_path).unwrap();
    (history, temp_dir)
}

fn ts(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn make_record(id: &str, title: &str, date: &str) -> MeetingRecord {
    MeetingRecord::new(
        id.to_string(),
        title.to_string(),
        ts(date),
        vec!["Sarah".into(), "David".into()],
        "We reviewed Q1 results and the European expansion plan.".into(),
        json!({
            "key_points": [{"point": "Q1 results discussion"}],
            "action_items": [{"task": "Complete payment integration", "assignee": "David"}],
            "decisions": [{"decision": "Push launch by two weeks"}]
        }),
        json!({"overall_score": 0.75}),
        json!({"effectiveness_score": 8}),
        Some(45),
        Some("planning".into()),
        vec!["q1".into(), "europe".into()],
    )
    .unwrap()
}

// =========================================================================
// Round-trip and point lookup
// =========================================================================

#[test]
fn store_then_get_round_trips_every_field() {
    let (history, _temp) = setup_test_db();
    let record = make_record("abc123def456", "Q1 Review", "2025-10-01T09:00:00Z");

    assert!(history.store(&record));

    let fetched = history.get("abc123def456").unwrap();
    assert_eq!(fetched.id, record.id);
    assert_eq!(fetched.title, record.title);
    assert_eq!(fetched.date, record.date);
    assert_eq!(fetched.participants, record.participants);
    assert_eq!(fetched.transcript, record.transcript);
    assert_eq!(fetched.summary, record.summary);
    assert_eq!(fetched.sentiment_analysis, record.sentiment_analysis);
    assert_eq!(fetched.coach_feedback, record.coach_feedback);
    assert_eq!(fetched.duration_minutes, Some(45));
    assert_eq!(fetched.meeting_type.as_deref(), Some("planning"));
    assert_eq!(fetched.tags, record.tags);
    // created_at is assigned at write time.
    assert!(fetched.created_at.is_some());
}

#[test]
fn get_absent_is_none_not_error() {
    let (history, _temp) = setup_test_db();
    assert!(history.get("does-not-exist").is_none());
}

#[test]
fn optional_fields_round_trip_as_defaults() {
    let (history, _temp) = setup_test_db();
    let record = MeetingRecord::new(
        "minimal00001".into(),
        "Minimal".into(),
        ts("2025-10-02T10:00:00Z"),
        vec![],
        "short transcript".into(),
        json!({}),
        json!({}),
        json!({}),
        None,
        None,
        vec![],
    )
    .unwrap();

    assert!(history.store(&record));

    let fetched = history.get("minimal00001").unwrap();
    assert!(fetched.duration_minutes.is_none());
    assert!(fetched.meeting_type.is_none());
    assert!(fetched.tags.is_empty());
    assert!(fetched.participants.is_empty());
}

// =========================================================================
// Overwrite semantics
// =========================================================================

#[test]
fn storing_same_id_overwrites_row_and_index() {
    let (history, _temp) = setup_test_db();

    let mut first = make_record("shared0000id", "Original title", "2025-10-01T09:00:00Z");
    first.transcript = "Original transcript about kumquats".into();
    assert!(history.store(&first));

    let mut second = make_record("shared0000id", "Updated title", "2025-10-03T09:00:00Z");
    second.transcript = "Updated transcript about persimmons".into();
    assert!(history.store(&second));

    // Exactly one row survives and its fields are the second store's.
    let all = history.recent(Some(100));
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].title, "Updated title");
    assert_eq!(all[0].date, ts("2025-10-03T09:00:00Z"));

    // The index entry was replaced, not accumulated.
    assert!(history.search("kumquats", None).is_empty());
    let hits = history.search("persimmons", None);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "shared0000id");
}

// =========================================================================
// Delete
// =========================================================================

#[test]
fn delete_removes_row_and_index_entry() {
    let (history, _temp) = setup_test_db();
    let record = make_record("todelete0001", "Doomed meeting", "2025-10-01T09:00:00Z");
    assert!(history.store(&record));
    assert_eq!(history.search("Doomed", None).len(), 1);

    assert!(history.delete("todelete0001"));

    assert!(history.get("todelete0001").is_none());
    assert!(history.search("Doomed", None).is_empty());
}

#[test]
fn delete_missing_returns_false() {
    let (history, _temp) = setup_test_db();
    assert!(!history.delete("never-stored"));

    let record = make_record("once00000001", "Once", "2025-10-01T09:00:00Z");
    history.store(&record);
    assert!(history.delete("once00000001"));
    // Second delete finds nothing.
    assert!(!history.delete("once00000001"));
}

// =========================================================================
// Recency and date-range queries
// =========================================================================

#[test]
fn recent_orders_by_date_descending_and_bounds() {
    let (history, _temp) = setup_test_db();
    history.store(&make_record("meeting-d3az", "Oldest", "2025-10-01T09:00:00Z"));
    history.store(&make_record("meeting-d1az", "Newest", "2025-10-15T09:00:00Z"));
    history.store(&make_record("meeting-d2az", "Middle", "2025-10-08T09:00:00Z"));

    let top_two = history.recent(Some(2));
    assert_eq!(top_two.len(), 2);
    assert_eq!(top_two[0].title, "Newest");
    assert_eq!(top_two[1].title, "Middle");

    // Default limit applies when unspecified.
    assert!(history.recent(None).len() <= DEFAULT_RECENT_LIMIT);
}

#[test]
fn date_range_is_inclusive_on_both_ends() {
    let (history, _temp) = setup_test_db();
    history.store(&make_record("edge-start01", "At start", "2025-10-01T00:00:00Z"));
    history.store(&make_record("edge-mid0001", "Between", "2025-10-05T12:00:00Z"));
    history.store(&make_record("edge-end0001", "At end", "2025-10-10T23:59:59Z"));
    history.store(&make_record("outside00001", "Before", "2025-09-30T23:59:59Z"));

    let records = history.by_date_range(ts("2025-10-01T00:00:00Z"), ts("2025-10-10T23:59:59Z"));

    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["At end", "Between", "At start"]);
}

// =========================================================================
// Full-text search
// =========================================================================

#[test]
fn search_matches_title_transcript_summary_and_tags() {
    let (history, _temp) = setup_test_db();
    history.store(&make_record("searchable01", "Q1 Review", "2025-10-01T09:00:00Z"));

    // Title
    assert_eq!(history.search("review", None).len(), 1);
    // Transcript
    assert_eq!(history.search("expansion", None).len(), 1);
    // Summary projection: action-item task and assignee
    assert_eq!(history.search("payment integration", None).len(), 1);
    assert_eq!(history.search("David", None).len(), 1);
    // Summary projection: decision text
    assert_eq!(history.search("launch", None).len(), 1);
    // Tags
    assert_eq!(history.search("europe", None).len(), 1);
}

#[test]
fn search_misses_return_empty() {
    let (history, _temp) = setup_test_db();
    history.store(&make_record("searchable02", "Q1 Review", "2025-10-01T09:00:00Z"));
    assert!(history.search("zyzzogeton", None).is_empty());
}

#[test]
fn malformed_query_fails_soft() {
    let (history, _temp) = setup_test_db();
    history.store(&make_record("searchable03", "Q1 Review", "2025-10-01T09:00:00Z"));

    // Unbalanced paren is an FTS5 syntax error; the engine swallows it.
    assert!(history.search("(unbalanced", None).is_empty());
    assert!(history.search("\"unterminated", None).is_empty());
}

#[test]
fn search_respects_limit() {
    let (history, _temp) = setup_test_db();
    for i in 0..5 {
        let id = format!("limittest{:03}", i);
        let date = format!("2025-10-{:02}T09:00:00Z", i + 1);
        history.store(&make_record(&id, "Common topic", &date));
    }

    assert_eq!(history.search("topic", Some(3)).len(), 3);
    assert_eq!(history.search("topic", None).len(), 5);
}

#[test]
fn search_ranks_stronger_matches_first() {
    let (history, _temp) = setup_test_db();

    let mut heavy = make_record("heavymatch01", "Budget budget budget", "2025-10-01T09:00:00Z");
    heavy.transcript = "Budget review: the budget was the whole meeting, budget line by line.".into();
    history.store(&heavy);

    let mut light = make_record("lightmatch01", "Weekly sync", "2025-10-02T09:00:00Z");
    light.transcript =
        "A long discussion about hiring, roadmaps, offsites, and one passing budget remark among \
         many, many other unrelated topics that dominated the hour."
            .into();
    history.store(&light);

    let hits = history.search("budget", None);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, "heavymatch01");
}

// =========================================================================
// Summary text projection
// =========================================================================

#[test]
fn summary_projection_tolerates_missing_keys() {
    let (history, _temp) = setup_test_db();
    let mut record = make_record("nokeys000001", "Sparse summary", "2025-10-01T09:00:00Z");
    record.summary = json!({"unrelated": true});

    // Store must succeed; the projection is simply empty.
    assert!(history.store(&record));
    assert_eq!(history.search("Sparse", None).len(), 1);
}

#[test]
fn extract_summary_text_concatenates_known_keys() {
    let summary = json!({
        "key_points": [{"point": "alpha"}, {"point": "beta"}],
        "action_items": [{"task": "gamma", "assignee": "Dana"}],
        "decisions": [{"decision": "delta"}]
    });
    assert_eq!(
        super::extract_summary_text(&summary),
        "alpha beta gamma Dana delta"
    );
    assert_eq!(super::extract_summary_text(&json!({})), "");
    // Non-array values for known keys are ignored, not an error.
    assert_eq!(
        super::extract_summary_text(&json!({"action_items": "oops"})),
        ""
    );
}
