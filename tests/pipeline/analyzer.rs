use leadbox::core::db;
use leadbox::pipeline::analyzer::{self, CITY_UNKNOWN, PRODUCT_UNSURE};
use leadbox::pipeline::orders;
use tempfile::tempdir;

fn seeded_root() -> tempfile::TempDir {
    let tmp = tempdir().unwrap();
    db::initialize_all(tmp.path()).unwrap();
    tmp
}

#[test]
fn test_rule_order_is_a_total_determinant() {
    let tmp = seeded_root();
    analyzer::add_rule(tmp.path(), "Wood", 300.0, "wood", "").unwrap();
    analyzer::add_rule(tmp.path(), "Half", 175.0, "half", "").unwrap();
    orders::save_order(tmp.path(), "Mike T.", "need half a cord", "Today").unwrap();

    analyzer::apply_pricing_logic(tmp.path()).unwrap();

    let all = orders::fetch_all(tmp.path()).unwrap();
    assert_eq!(all[0].product.as_deref(), Some("Half"));
    assert_eq!(all[0].value, Some(175.0));
    assert_eq!(all[0].status, orders::STATUS_ANALYZED);
}

#[test]
fn test_earlier_rule_beats_later_rule_when_both_match() {
    let tmp = seeded_root();
    analyzer::add_rule(tmp.path(), "Full Cord", 300.0, "full cord, 1 cord", "A Full Cord is $300").unwrap();
    analyzer::add_rule(tmp.path(), "Half Cord", 175.0, "half cord, 1/2", "Half Cord is $175").unwrap();
    orders::save_order(
        tmp.path(),
        "Construction Co.",
        "price for a full cord? or a half cord if cheaper",
        "Today",
    )
    .unwrap();

    analyzer::apply_pricing_logic(tmp.path()).unwrap();

    let all = orders::fetch_all(tmp.path()).unwrap();
    assert_eq!(all[0].product.as_deref(), Some("Full Cord"));
    assert_eq!(all[0].value, Some(300.0));
}

#[test]
fn test_unmatched_order_gets_unsure_and_zero() {
    let tmp = seeded_root();
    analyzer::add_rule(tmp.path(), "Full Cord", 300.0, "full cord", "").unwrap();
    orders::save_order(tmp.path(), "Sarah J.", "do you deliver on weekends?", "Today").unwrap();

    analyzer::apply_pricing_logic(tmp.path()).unwrap();

    let all = orders::fetch_all(tmp.path()).unwrap();
    assert_eq!(all[0].product.as_deref(), Some(PRODUCT_UNSURE));
    assert_eq!(all[0].value, Some(0.0));
    assert_eq!(all[0].city.as_deref(), Some(CITY_UNKNOWN));
    assert_eq!(all[0].address, None);
}

#[test]
fn test_address_and_city_extraction() {
    let tmp = seeded_root();
    analyzer::add_rule(tmp.path(), "Full Cord", 300.0, "cord", "").unwrap();
    orders::save_order(
        tmp.path(),
        "Mike T.",
        "one cord, deliver to 123 Oak St please, I'm in Longview",
        "Today",
    )
    .unwrap();

    analyzer::apply_pricing_logic(tmp.path()).unwrap();

    let all = orders::fetch_all(tmp.path()).unwrap();
    assert_eq!(all[0].city.as_deref(), Some("Longview"));
    assert_eq!(all[0].address.as_deref(), Some("123 Oak St, Longview, TX"));
}

#[test]
fn test_analysis_pass_is_idempotent() {
    let tmp = seeded_root();
    analyzer::add_rule(tmp.path(), "Full Cord", 300.0, "cord", "").unwrap();
    orders::save_order(tmp.path(), "Mike T.", "a cord to 55 Pine Rd, Tyler", "Today").unwrap();

    analyzer::apply_pricing_logic(tmp.path()).unwrap();
    let first = orders::fetch_all(tmp.path()).unwrap();
    analyzer::apply_pricing_logic(tmp.path()).unwrap();
    let second = orders::fetch_all(tmp.path()).unwrap();

    assert_eq!(first[0].product, second[0].product);
    assert_eq!(first[0].value, second[0].value);
    assert_eq!(first[0].address, second[0].address);
    assert_eq!(first[0].city, second[0].city);
    assert_eq!(second[0].status, orders::STATUS_ANALYZED);
}

#[test]
fn test_rules_list_in_position_order_and_remove() {
    let tmp = seeded_root();
    let a = analyzer::add_rule(tmp.path(), "A", 1.0, "a", "").unwrap();
    let _b = analyzer::add_rule(tmp.path(), "B", 2.0, "b", "").unwrap();

    let rules = analyzer::list_rules(tmp.path()).unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].name, "A");
    assert_eq!(rules[1].position, 1);

    analyzer::remove_rule(tmp.path(), &a).unwrap();
    let rules = analyzer::list_rules(tmp.path()).unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].name, "B");
}

#[test]
fn test_rule_without_keywords_is_rejected() {
    let tmp = seeded_root();
    assert!(analyzer::add_rule(tmp.path(), "Empty", 1.0, " , ,", "").is_err());
}
