use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TesseraError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        TesseraError::engine_init("x")
            .to_string()
            .contains("engine init error:")
    );
    assert!(
        TesseraError::engine_step("x")
            .to_string()
            .contains("engine step error:")
    );
    assert!(
        TesseraError::channel("x")
            .to_string()
            .contains("channel error:")
    );
    assert!(TesseraError::state("x").to_string().contains("state error:"));
    assert!(
        TesseraError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TesseraError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde_variant() {
    let err: TesseraError = serde_json::from_str::<u32>("nope").unwrap_err().into();
    assert!(matches!(err, TesseraError::Serde(_)));
}
