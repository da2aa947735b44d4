use super::*;

#[test]
fn new_canvas_is_opaque_black() {
    let s = CanvasSurface::new(3, 2);
    assert_eq!(s.image().dimensions(), (3, 2));
    assert!(s.image().pixels().all(|p| p.0 == [0, 0, 0, 255]));
    assert_eq!(s.presented(), 0);
}

#[test]
fn present_replaces_contents_and_counts() {
    let mut s = CanvasSurface::new(2, 1);
    let frame = Bitmap::from_rgba(2, 1, vec![10, 20, 30, 40, 50, 60, 70, 80]).unwrap();
    s.present(&frame).unwrap();
    assert_eq!(s.presented(), 1);
    assert_eq!(s.image().get_pixel(1, 0).0, [50, 60, 70, 80]);
    assert_eq!(s.into_image().into_raw(), vec![10, 20, 30, 40, 50, 60, 70, 80]);
}

#[test]
fn mismatched_frame_is_rejected() {
    let mut s = CanvasSurface::new(2, 2);
    let frame = Bitmap::from_rgba(1, 1, vec![0; 4]).unwrap();
    let err = s.present(&frame).unwrap_err();
    assert!(err.to_string().contains("does not match surface 2x2"));
    assert_eq!(s.presented(), 0);
}

#[test]
fn reset_resizes_and_clears() {
    let mut s = CanvasSurface::new(1, 1);
    s.present(&Bitmap::from_rgba(1, 1, vec![9; 4]).unwrap()).unwrap();
    s.reset(4, 4);
    assert_eq!(s.image().dimensions(), (4, 4));
    assert!(s.image().pixels().all(|p| p.0 == [0, 0, 0, 255]));
}

#[test]
fn save_png_round_trips_through_the_image_crate() {
    let dir = std::env::temp_dir().join(format!("tessera-surface-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("canvas.png");

    let mut s = CanvasSurface::new(2, 2);
    s.present(&Bitmap::from_rgba(2, 2, vec![200; 16]).unwrap()).unwrap();
    s.save_png(&path).unwrap();

    let back = image::open(&path).unwrap().to_rgba8();
    assert_eq!(back.get_pixel(0, 0).0, [200, 200, 200, 200]);
    let _ = std::fs::remove_dir_all(&dir);
}
