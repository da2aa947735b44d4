use super::*;

#[test]
fn defaults_are_valid() {
    let cfg = SessionConfig::default();
    assert_eq!(cfg.max_iterations, 50_000);
    assert_eq!(cfg.batch_size, 10);
    assert!((cfg.target_accuracy - 0.9).abs() < f32::EPSILON);
    cfg.validate().unwrap();
}

#[test]
fn out_of_range_values_are_rejected_not_clamped() {
    let bad = [
        SessionConfig {
            max_iterations: 0,
            ..SessionConfig::default()
        },
        SessionConfig {
            target_accuracy: 0.0,
            ..SessionConfig::default()
        },
        SessionConfig {
            target_accuracy: 1.01,
            ..SessionConfig::default()
        },
        SessionConfig {
            target_accuracy: f32::NAN,
            ..SessionConfig::default()
        },
        SessionConfig {
            batch_size: 0,
            ..SessionConfig::default()
        },
    ];
    for cfg in bad {
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, TesseraError::Validation(_)), "{cfg:?}");
    }

    SessionConfig {
        target_accuracy: 1.0,
        ..SessionConfig::default()
    }
    .validate()
    .unwrap();
}

#[test]
fn json_fills_missing_fields_with_defaults() {
    let cfg = SessionConfig::from_json_str(r#"{ "batch_size": 25, "algorithm": 2 }"#).unwrap();
    assert_eq!(cfg.batch_size, 25);
    assert_eq!(cfg.algorithm, AlgorithmVariant(2));
    assert_eq!(cfg.max_iterations, DEFAULT_MAX_ITERATIONS);
    assert_eq!(cfg.seed, None);
}

#[test]
fn json_rejects_unknown_fields() {
    let err = SessionConfig::from_json_str(r#"{ "batchsize": 25 }"#).unwrap_err();
    assert!(matches!(err, TesseraError::Serde(_)));
}

#[test]
fn start_config_checks_buffer_length() {
    let ok = StartConfig::new(vec![0; 2 * 3 * 4], 2, 3, SessionConfig::default());
    assert!(ok.is_ok());

    let err = StartConfig::new(vec![0; 10], 2, 3, SessionConfig::default()).unwrap_err();
    assert!(err.to_string().contains("must be 24 bytes, got 10"));

    let err = StartConfig::new(Vec::new(), 0, 3, SessionConfig::default()).unwrap_err();
    assert!(err.to_string().contains("non-empty"));
}

#[test]
fn start_config_debug_elides_pixels() {
    let cfg = StartConfig::new(vec![0; 4], 1, 1, SessionConfig::default()).unwrap();
    let dbg = format!("{cfg:?}");
    assert!(dbg.contains("[4 bytes]"));
}
