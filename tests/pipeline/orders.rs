mod util;

use leadbox::core::db;
use leadbox::core::page::PageError;
use leadbox::core::session;
use leadbox::pipeline::fetcher::CONTENT_SELECTOR;
use leadbox::pipeline::harvest;
use leadbox::pipeline::indexer::{ANCHOR_SELECTOR, LISTING_URL, THREAD_SELECTOR, TIME_SELECTOR};
use leadbox::pipeline::orders;
use std::fs;
use tempfile::tempdir;
use util::FakePage;

fn seeded_root() -> tempfile::TempDir {
    let tmp = tempdir().unwrap();
    db::initialize_all(tmp.path()).unwrap();
    tmp
}

#[test]
fn test_duplicate_raw_message_is_rejected_not_an_error() {
    let tmp = seeded_root();
    assert!(orders::save_order(tmp.path(), "Mike T.", "need a cord", "Today").unwrap());
    assert!(!orders::save_order(tmp.path(), "Mike T.", "need a cord", "Yesterday").unwrap());
    assert_eq!(orders::fetch_all(tmp.path()).unwrap().len(), 1);
}

#[test]
fn test_new_orders_start_in_status_new() {
    let tmp = seeded_root();
    orders::save_order(tmp.path(), "Sarah J.", "half cord please", "Jul 4").unwrap();
    let all = orders::fetch_all(tmp.path()).unwrap();
    assert_eq!(all[0].status, orders::STATUS_NEW);
    assert_eq!(all[0].product, None);
    assert_eq!(all[0].date_found, "Jul 4");
}

#[test]
fn test_delete_order_and_not_found() {
    let tmp = seeded_root();
    orders::save_order(tmp.path(), "Mike T.", "need a cord", "Today").unwrap();
    let id = orders::fetch_all(tmp.path()).unwrap()[0].id.clone();

    orders::delete_order(tmp.path(), &id).unwrap();
    assert!(orders::fetch_all(tmp.path()).unwrap().is_empty());
    assert!(orders::delete_order(tmp.path(), &id).is_err());
}

#[test]
fn test_fetch_all_preserves_import_order() {
    let tmp = seeded_root();
    for i in 0..4 {
        orders::save_order(tmp.path(), "C", &format!("message {}", i), "Today").unwrap();
    }
    let all = orders::fetch_all(tmp.path()).unwrap();
    let msgs: Vec<_> = all.iter().map(|o| o.raw_message.as_str()).collect();
    assert_eq!(msgs, vec!["message 0", "message 1", "message 2", "message 3"]);
}

fn scripted_inbox() -> FakePage {
    let mut page = FakePage::new();
    for (name, slug, date) in [
        ("Mike T.", "mike", "5 min ago"),
        ("Sarah J.", "sarah", "Yesterday"),
    ] {
        let thread = page.add_node(LISTING_URL, THREAD_SELECTOR, name);
        let anchor = page.add_child(thread, ANCHOR_SELECTOR, "");
        page.set_attr(anchor, "href", &format!("/t/{}", slug));
        page.add_child(thread, TIME_SELECTOR, date);
        page.add_node(
            &format!("https://inbox.example.com/t/{}", slug),
            CONTENT_SELECTOR,
            &format!(
                "Inbox\nChats\nHello from {}, any seasoned firewood available?\nYes we do, when do you need it?\nok",
                name
            ),
        );
    }
    page
}

#[test]
fn test_harvest_imports_new_orders_once() {
    let tmp = seeded_root();
    fs::write(session::session_path(tmp.path()), "{}").unwrap();

    let report = harvest::run_harvest(tmp.path(), || Ok(scripted_inbox()), 15, 14).unwrap();
    assert_eq!(report.targets, 2);
    assert_eq!(report.fetched, 2);
    assert_eq!(report.imported, 2);
    assert!(!report.skipped_no_session);

    let all = orders::fetch_all(tmp.path()).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].customer, "Mike T.");
    // Snippet keeps only lines above the noise threshold, joined in order.
    assert!(all[0].raw_message.contains(" || "));
    assert!(!all[0].raw_message.contains("Inbox"));

    // Re-harvesting identical conversations imports nothing new.
    let rerun = harvest::run_harvest(tmp.path(), || Ok(scripted_inbox()), 15, 14).unwrap();
    assert_eq!(rerun.imported, 0);
    assert_eq!(orders::fetch_all(tmp.path()).unwrap().len(), 2);
}

#[test]
fn test_harvest_without_session_is_noop() {
    let tmp = seeded_root();
    let report = harvest::run_harvest(
        tmp.path(),
        || -> Result<FakePage, PageError> {
            panic!("connect must not be called without a session artifact")
        },
        15,
        14,
    )
    .unwrap();
    assert!(report.skipped_no_session);
    assert_eq!(report.targets, 0);
}

#[test]
fn test_harvest_skips_failing_target_and_imports_the_rest() {
    let tmp = seeded_root();
    fs::write(session::session_path(tmp.path()), "{}").unwrap();

    let mut page = scripted_inbox();
    page.fail_navigation_to("https://inbox.example.com/t/mike");

    let report = harvest::run_harvest(tmp.path(), move || Ok(page), 15, 14).unwrap();
    assert_eq!(report.targets, 2);
    assert_eq!(report.fetched, 1);
    assert_eq!(report.imported, 1);
    assert_eq!(orders::fetch_all(tmp.path()).unwrap()[0].customer, "Sarah J.");
}
