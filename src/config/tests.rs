use clap::Parser;
use rust_decimal::Decimal;

use crate::domain::types::{SortField, SortOrder};

use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("info".to_string());
    raw.search.accent_insensitive = Some(false);

    let overrides = GlobalOverrides {
        log_level: Some("debug".to_string()),
        accent_insensitive: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(settings.search.accent_insensitive);
}

#[test]
fn defaults_match_catalog_and_cache_defaults() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.catalog.latency, LatencyProfile::default());
    assert_eq!(settings.cache.min_search_len, 3);
    assert_eq!(settings.cache.list_stale_secs, 300);
    assert_eq!(settings.logging.format, LogFormat::Compact);
    assert!(!settings.search.accent_insensitive);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = GlobalOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.logging.format, LogFormat::Json);
}

#[test]
fn disabling_latency_zeroes_every_operation() {
    let mut raw = RawSettings::default();
    raw.catalog.list_ms = Some(1_000);
    raw.apply_overrides(&GlobalOverrides {
        simulate_latency: Some(false),
        ..Default::default()
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.catalog.latency, LatencyProfile::instant());
}

#[test]
fn per_operation_latency_can_be_tuned() {
    let mut raw = RawSettings::default();
    raw.catalog.get_ms = Some(50);

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.catalog.latency.get_ms, 50);
    assert_eq!(
        settings.catalog.latency.list_ms,
        LatencyProfile::default().list_ms
    );
}

#[test]
fn zero_capacity_is_rejected() {
    let mut raw = RawSettings::default();
    raw.cache.detail_limit = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero capacity must fail");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.detail_limit",
            ..
        }
    ));
}

#[test]
fn invalid_log_level_is_rejected() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());

    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn parse_list_arguments() {
    let args = CliArgs::try_parse_from([
        "vitrina",
        "list",
        "--category",
        "Electrónicos",
        "--min-price",
        "3000",
        "--sort-by",
        "price",
        "--sort-order",
        "asc",
        "--limit",
        "5",
    ])
    .expect("parse list");

    let Command::List(list) = args.command else {
        panic!("expected list command");
    };
    let filter = list.filter();
    assert_eq!(filter.category.as_deref(), Some("Electrónicos"));
    assert_eq!(filter.min_price, Some(Decimal::new(3000, 0)));

    let page = list.page_request();
    assert_eq!(page.sort_by, Some(SortField::Price));
    assert_eq!(page.sort_order, Some(SortOrder::Asc));
    assert_eq!(page.limit, Some(5));
    assert_eq!(page.page, None);
}

#[test]
fn parse_global_flags_after_subcommand() {
    let args = CliArgs::try_parse_from([
        "vitrina",
        "show",
        "4",
        "--log-level",
        "debug",
        "--simulate-latency",
        "false",
    ])
    .expect("parse show");

    assert!(matches!(args.command, Command::Show(ShowArgs { ref id }) if id == "4"));
    assert_eq!(args.overrides.log_level.as_deref(), Some("debug"));
    assert_eq!(args.overrides.simulate_latency, Some(false));
}

#[test]
fn unknown_sort_field_is_rejected() {
    let result = CliArgs::try_parse_from(["vitrina", "list", "--sort-by", "imageUrl"]);
    assert!(result.is_err());
}
