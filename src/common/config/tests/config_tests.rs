//! Unit tests for common-config crate

use common_config::{RewriteConfig, SiftConfig, TraceLevel, WalkOrder};

#[test]
fn test_sift_config_default() {
    let config = SiftConfig::default();

    assert!(config.rewrite.enabled);
    assert_eq!(config.rewrite.trace, TraceLevel::Off);
    assert_eq!(config.rewrite.validate, cfg!(debug_assertions));
    assert_eq!(config.rewrite.max_visits, None);
    assert!(config.rewrite.phase_budgets.is_empty());
}

#[test]
fn test_disabled_config() {
    let config = RewriteConfig::disabled();

    assert!(!config.enabled);
    assert_eq!(config.trace, TraceLevel::Off);
}

#[test]
fn test_builder_helpers() {
    let config = RewriteConfig::default()
        .with_trace(TraceLevel::Explain)
        .with_validate(true)
        .with_max_visits(500)
        .with_phase_budget("simplify", 0)
        .with_phase_budget("aggregate", 3);

    assert_eq!(config.trace, TraceLevel::Explain);
    assert!(config.validate);
    assert_eq!(config.max_visits, Some(500));
    assert_eq!(config.phase_budget("simplify"), Some(0));
    assert_eq!(config.phase_budget("aggregate"), Some(3));
    assert_eq!(config.phase_budget("cleanup"), None);
}

#[test]
fn test_trace_level_flags() {
    assert!(!TraceLevel::Off.is_enabled());
    assert!(TraceLevel::Fire.is_enabled());
    assert!(!TraceLevel::Fire.wants_snapshot());
    assert!(TraceLevel::Explain.is_enabled());
    assert!(TraceLevel::Explain.wants_snapshot());
}

#[test]
fn test_from_json_partial() {
    let config = SiftConfig::from_json(
        r#"{ "rewrite": { "trace": "fire", "phase_budgets": { "const-eval": 0 } } }"#,
    )
    .unwrap();

    // Unspecified fields keep their defaults.
    assert!(config.rewrite.enabled);
    assert_eq!(config.rewrite.trace, TraceLevel::Fire);
    assert_eq!(config.rewrite.phase_budget("const-eval"), Some(0));
}

#[test]
fn test_from_json_empty_object() {
    let config = SiftConfig::from_json("{}").unwrap();
    assert_eq!(config, SiftConfig::default());
}

#[test]
fn test_from_json_disabled() {
    let config = SiftConfig::from_json(r#"{ "rewrite": { "enabled": false } }"#).unwrap();
    assert!(!config.rewrite.enabled);
}

#[test]
fn test_from_json_rejects_zero_visit_cap() {
    let err = SiftConfig::from_json(r#"{ "rewrite": { "max_visits": 0 } }"#).unwrap_err();
    assert!(err.to_string().contains("max_visits"));
}

#[test]
fn test_from_json_rejects_blank_phase_name() {
    let err =
        SiftConfig::from_json(r#"{ "rewrite": { "phase_budgets": { " ": 10 } } }"#).unwrap_err();
    assert!(err.to_string().starts_with("ConfigError"));
}

#[test]
fn test_from_json_malformed() {
    let err = SiftConfig::from_json("{ rewrite: ").unwrap_err();
    assert!(err.to_string().starts_with("SerdeJsonError"));
}

#[test]
fn test_to_json_contains_settings() {
    let mut config = SiftConfig::default();
    config.rewrite = config
        .rewrite
        .with_trace(TraceLevel::Explain)
        .with_phase_budget("simplify", 42);

    let json = config.to_json().unwrap();
    assert!(json.contains("\"explain\""));
    assert!(json.contains("\"simplify\": 42"));

    let parsed = SiftConfig::from_json(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_walk_order_serialization() {
    assert_eq!(WalkOrder::default(), WalkOrder::PostOrder);
    assert_eq!(
        serde_json::to_string(&WalkOrder::RootOnly).unwrap(),
        "\"root_only\""
    );
    let order: WalkOrder = serde_json::from_str("\"pre_order\"").unwrap();
    assert_eq!(order, WalkOrder::PreOrder);
}
