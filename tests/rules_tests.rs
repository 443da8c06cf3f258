//! Cache-Control rule evaluation: age parsing, bracket walk, rule order.

use bloblog::rules::{AgeSpec, CacheControlRules};
use bloblog::utils::parse_config;
use std::path::Path;

const HOUR_NS: i64 = 3_600 * 1_000_000_000;
const DAY_NS: i64 = 24 * HOUR_NS;
const NOW: i64 = 1_750_000_000 * 1_000_000_000;

const BASE_CONFIG: &str = r#"
[sync]
root_path = "public"

[deployment.storage]
type = "memory"

[cache_control.default]
max-age = 3600
settings = "public,must-revalidate"
"#;

fn rules_from(extra: &str) -> CacheControlRules {
    let text = format!("{BASE_CONFIG}\n{extra}");
    parse_config(&text, Path::new("/srv")).unwrap().rules
}

fn html_rules() -> CacheControlRules {
    rules_from(
        r#"
[[cache_control.rules]]
mimetype = ["text/html"]
settings = "public"
age = [{ item = "1d", max = "1w" }, { item = "30d", max = "1y" }]
"#,
    )
}

// --- AgeSpec ---

#[test]
fn test_age_units() {
    assert_eq!(AgeSpec::parse("1d").unwrap().as_secs(), 86_400);
    assert_eq!(AgeSpec::parse("2w").unwrap().as_secs(), 14 * 86_400);
    assert_eq!(AgeSpec::parse("1m").unwrap().as_secs(), 30 * 86_400);
    assert_eq!(AgeSpec::parse("1y").unwrap().as_secs(), 365 * 86_400);
}

#[test]
fn test_age_unknown_unit_is_error() {
    assert!(AgeSpec::parse("3h").is_err());
    assert!(AgeSpec::parse("").is_err());
    assert!(AgeSpec::parse("d").is_err());
    assert!(AgeSpec::parse("x1d").is_err());
}

#[test]
fn test_config_with_unknown_unit_fails_to_load() {
    let text = format!(
        "{BASE_CONFIG}\n{}",
        r#"
[[cache_control.rules]]
mimetype = ["text/html"]
settings = "public"
age = [{ item = "1d", max = "1fortnight" }]
"#
    );
    assert!(parse_config(&text, Path::new("/srv")).is_err());
}

#[test]
fn test_age_too_large_is_error() {
    assert!(AgeSpec::parse("999999999999999999y").is_err());
    assert!(AgeSpec::parse("18446744073709551615d").is_err());
    // Largest day count that still fits in seconds.
    let max_days = u64::MAX / 86_400;
    assert_eq!(
        AgeSpec::parse(&format!("{max_days}d")).unwrap().as_secs(),
        max_days * 86_400
    );

    let text = format!(
        "{BASE_CONFIG}\n{}",
        r#"
[[cache_control.rules]]
mimetype = ["text/html"]
age = [{ item = "1d", max = "999999999999999999y" }]
"#
    );
    assert!(parse_config(&text, Path::new("/srv")).is_err());
}

// --- evaluate ---

#[test]
fn test_default_when_young() {
    let rules = html_rules();
    assert_eq!(
        rules.evaluate("text/html", NOW - HOUR_NS, NOW),
        "max-age=3600,public,must-revalidate"
    );
}

#[test]
fn test_first_bracket_selected() {
    let rules = html_rules();
    assert_eq!(
        rules.evaluate("text/html", NOW - 2 * DAY_NS, NOW),
        "max-age=604800,public"
    );
}

#[test]
fn test_later_bracket_overrides() {
    let rules = html_rules();
    assert_eq!(
        rules.evaluate("text/html", NOW - 45 * DAY_NS, NOW),
        "max-age=31536000,public"
    );
}

#[test]
fn test_threshold_must_be_exceeded() {
    let rules = html_rules();
    assert_eq!(
        rules.evaluate("text/html", NOW - DAY_NS, NOW),
        "max-age=3600,public,must-revalidate"
    );
    assert_eq!(
        rules.evaluate("text/html", NOW - DAY_NS - 1, NOW),
        "max-age=604800,public"
    );
}

#[test]
fn test_unmatched_content_type_gets_default() {
    let rules = html_rules();
    assert_eq!(
        rules.evaluate("image/png", NOW - 400 * DAY_NS, NOW),
        "max-age=3600,public,must-revalidate"
    );
}

#[test]
fn test_future_mtime_treated_as_new() {
    let rules = html_rules();
    assert_eq!(
        rules.evaluate("text/html", NOW + DAY_NS, NOW),
        rules.default_header()
    );
}

#[test]
fn test_unexceeded_bracket_stops_later_rules() {
    let rules = rules_from(
        r#"
[[cache_control.rules]]
mimetype = ["text/css"]
settings = "first"
age = [{ item = "1w", max = "1m" }]

[[cache_control.rules]]
mimetype = ["text/css"]
settings = "second"
age = [{ item = "1d", max = "1y" }]
"#,
    );
    // 3 days: first rule's bracket not exceeded, second rule never consulted.
    assert_eq!(
        rules.evaluate("text/css", NOW - 3 * DAY_NS, NOW),
        "max-age=3600,public,must-revalidate"
    );
}

#[test]
fn test_fully_exceeded_rule_lets_next_rule_apply() {
    let rules = rules_from(
        r#"
[[cache_control.rules]]
mimetype = ["text/css"]
settings = "first"
age = [{ item = "1d", max = "1w" }]

[[cache_control.rules]]
mimetype = ["text/css", "text/javascript"]
settings = "second"
age = [{ item = "2d", max = "1y" }]
"#,
    );
    assert_eq!(
        rules.evaluate("text/css", NOW - 3 * DAY_NS, NOW),
        "max-age=31536000,second"
    );
}

#[test]
fn test_empty_settings_has_no_trailing_comma() {
    let rules = rules_from(
        r#"
[[cache_control.rules]]
mimetype = ["application/json"]
age = [{ item = "1d", max = "2d" }]
"#,
    );
    assert_eq!(
        rules.evaluate("application/json", NOW - 5 * DAY_NS, NOW),
        "max-age=172800"
    );
}
