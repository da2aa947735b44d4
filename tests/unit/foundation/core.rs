use super::*;

#[test]
fn bitmap_rejects_wrong_length() {
    assert!(Bitmap::from_rgba(2, 2, vec![0; 16]).is_ok());
    let err = Bitmap::from_rgba(2, 2, vec![0; 15]).unwrap_err();
    assert!(err.to_string().contains("needs 16 bytes, got 15"));
}

#[test]
fn bitmap_wraps_buffer_without_copy() {
    let data = vec![7u8; 3 * 5 * 4];
    let ptr = data.as_ptr();
    let bmp = Bitmap::from_rgba(3, 5, data).unwrap();
    assert_eq!(bmp.as_bytes().as_ptr(), ptr);
    assert_eq!((bmp.width(), bmp.height()), (3, 5));
    assert_eq!(bmp.into_raw().as_ptr(), ptr);
}

#[test]
fn rgba_len_checks_overflow() {
    assert_eq!(rgba_len(100, 100).unwrap(), 40_000);
    assert_eq!(rgba_len(0, 9).unwrap(), 0);
    if usize::BITS == 32 {
        assert!(rgba_len(u32::MAX, u32::MAX).is_err());
    }
}

#[test]
fn session_id_display() {
    assert_eq!(SessionId(4).to_string(), "session-4");
}

#[test]
fn algorithm_variant_is_a_bare_integer_in_json() {
    let v: AlgorithmVariant = serde_json::from_str("2").unwrap();
    assert_eq!(v, AlgorithmVariant(2));
    assert_eq!(serde_json::to_string(&AlgorithmVariant(1)).unwrap(), "1");
}
