use leadbox::core::broker::DbBroker;
use leadbox::core::db;
use leadbox::core::page::PageError;
use leadbox::core::session;
use leadbox::pipeline::autopilot::{self, SchedulerConfig};
use leadbox::pipeline::leads;
use leadbox::pipeline::watchlist;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_init_creates_both_bins_and_audit_log() {
    let tmp = tempdir().unwrap();
    db::initialize_all(tmp.path()).unwrap();

    assert!(db::intel_db_path(tmp.path()).exists());
    assert!(db::orders_db_path(tmp.path()).exists());

    let broker = DbBroker::new(tmp.path());
    let log = fs::read_to_string(broker.audit_log_path()).unwrap();
    assert!(log.lines().count() >= 2);
    for line in log.lines() {
        let ev: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(ev["status"], "success");
        assert!(ev["op"].as_str().unwrap().ends_with(".init"));
    }
}

#[test]
fn test_broker_logs_failures_too() {
    let tmp = tempdir().unwrap();
    db::initialize_all(tmp.path()).unwrap();

    let broker = DbBroker::new(tmp.path());
    let result: Result<(), _> =
        broker.with_conn(&db::intel_db_path(tmp.path()), "test.bad_sql", |conn| {
            conn.execute("SELECT * FROM no_such_table", [])?;
            Ok(())
        });
    assert!(result.is_err());

    let log = fs::read_to_string(broker.audit_log_path()).unwrap();
    let last: serde_json::Value = serde_json::from_str(log.lines().last().unwrap()).unwrap();
    assert_eq!(last["op"], "test.bad_sql");
    assert_eq!(last["status"], "error");
}

#[test]
fn test_watchlist_is_unique_by_exact_text() {
    let tmp = tempdir().unwrap();
    db::initialize_all(tmp.path()).unwrap();

    assert!(watchlist::add_term(tmp.path(), "cord").unwrap());
    assert!(!watchlist::add_term(tmp.path(), "cord").unwrap());
    // Different case is a different term.
    assert!(watchlist::add_term(tmp.path(), "Cord").unwrap());

    let terms = watchlist::list_terms(tmp.path()).unwrap();
    assert_eq!(terms.len(), 2);
    assert_eq!(terms[0].word, "cord");

    watchlist::remove_term(tmp.path(), &terms[0].id).unwrap();
    assert_eq!(watchlist::list_terms(tmp.path()).unwrap().len(), 1);
    assert!(watchlist::remove_term(tmp.path(), "missing-id").is_err());
}

#[test]
fn test_scan_state_defaults_and_updates() {
    let tmp = tempdir().unwrap();
    db::initialize_all(tmp.path()).unwrap();

    let state = autopilot::read_scan_state(tmp.path()).unwrap();
    assert!(!state.active);
    assert_eq!(state.interval, "1 hour");

    autopilot::set_active(tmp.path(), true).unwrap();
    autopilot::set_interval(tmp.path(), "2 min").unwrap();
    let state = autopilot::read_scan_state(tmp.path()).unwrap();
    assert!(state.active);
    assert_eq!(state.interval, "2 min");
    assert!(!state.updated_at.is_empty());

    assert!(autopilot::set_interval(tmp.path(), "3 fortnights").is_err());
}

#[test]
fn test_session_artifact_presence() {
    let tmp = tempdir().unwrap();
    assert!(!session::has_session(tmp.path()));
    fs::write(session::session_path(tmp.path()), "{}").unwrap();
    assert!(session::has_session(tmp.path()));
}

#[test]
fn test_leads_csv_export() {
    let tmp = tempdir().unwrap();
    db::initialize_all(tmp.path()).unwrap();
    leads::insert_lead_if_absent(tmp.path(), "Mike T.", "need a cord, asap", "cord", "2026-08-25 09:30")
        .unwrap();

    let out = tmp.path().join("leads.csv");
    let rows = leads::export_csv(tmp.path(), &out).unwrap();
    assert_eq!(rows, 1);

    let body = fs::read_to_string(&out).unwrap();
    let mut lines = body.lines();
    assert_eq!(
        lines.next().unwrap(),
        "id,scanned_at,user_profile,keyword_found,raw_message"
    );
    // The comma in the message forces quoting.
    assert!(lines.next().unwrap().ends_with("\"need a cord, asap\""));
}

#[test]
fn test_scheduler_runs_at_most_once_and_logs_cycles() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().to_path_buf();
    db::initialize_all(&root).unwrap();
    autopilot::set_active(&root, true).unwrap();

    let config = SchedulerConfig {
        idle_poll: Duration::from_millis(10),
    };
    // No watch terms exist, so the cycle records a skipped scan without ever
    // needing a page backend.
    let connect = || -> Result<leadbox::core::page::NullPage, PageError> {
        Err(PageError::Session("no backend in this test".to_string()))
    };
    assert!(autopilot::spawn_scheduler(root.clone(), config.clone(), connect));
    assert!(autopilot::scheduler_running());
    // Second start is a guarded no-op.
    assert!(!autopilot::spawn_scheduler(root.clone(), config, connect));

    let events_path = autopilot::autopilot_events_path(&root);
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(log) = fs::read_to_string(&events_path) {
            if log.contains("autopilot.scan") {
                assert!(log.contains("SkippedNoTerms"));
                break;
            }
        }
        assert!(
            std::time::Instant::now() < deadline,
            "scheduler never logged a scan cycle"
        );
        std::thread::sleep(Duration::from_millis(20));
    }
}
