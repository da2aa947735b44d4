use super::*;

fn genome(polygons: Vec<Polygon>, w: usize, h: usize) -> Genome {
    Genome {
        polygons,
        width: w,
        height: h,
    }
}

#[test]
fn empty_genome_is_transparent_black() {
    let buf = rasterize(&genome(vec![], 4, 3));
    assert_eq!(buf.len(), 4 * 3 * 4);
    assert!(buf.iter().all(|&b| b == 0));
}

#[test]
fn opaque_square_covers_its_interior() {
    let square = Polygon {
        points: vec![(1.0, 1.0), (6.0, 1.0), (6.0, 6.0), (1.0, 6.0)],
        colour: [255, 0, 0, 255],
    };
    let buf = rasterize(&genome(vec![square], 8, 8));
    let px = |x: usize, y: usize| &buf[(y * 8 + x) * 4..(y * 8 + x) * 4 + 4];

    assert_eq!(px(3, 3), &[255, 0, 0, 255]);
    assert_eq!(px(0, 0), &[0, 0, 0, 0]);
    assert_eq!(px(7, 7), &[0, 0, 0, 0]);
}

#[test]
fn translucent_polygons_blend_in_order() {
    let full = vec![(0.0, 0.0), (3.0, 0.0), (3.0, 3.0), (0.0, 3.0)];
    let white = Polygon {
        points: full.clone(),
        colour: [255, 255, 255, 255],
    };
    let half_black = Polygon {
        points: full,
        colour: [0, 0, 0, 128],
    };
    let buf = rasterize(&genome(vec![white, half_black], 4, 4));
    let v = buf[(4 + 1) * 4];
    assert!((120..=130).contains(&v), "got {v}");
    assert_eq!(buf[(4 + 1) * 4 + 3], 255);
}

#[test]
fn off_canvas_and_degenerate_polygons_are_ignored() {
    let outside = Polygon {
        points: vec![(-20.0, -20.0), (-10.0, -20.0), (-10.0, -10.0)],
        colour: [255, 255, 255, 255],
    };
    let line = Polygon {
        points: vec![(0.0, 0.0), (3.0, 3.0)],
        colour: [255, 255, 255, 255],
    };
    let buf = rasterize(&genome(vec![outside, line], 4, 4));
    assert!(buf.iter().all(|&b| b == 0));
}

#[test]
fn polygon_straddling_the_top_edge_is_clipped() {
    let tall = Polygon {
        points: vec![(0.0, -10.0), (3.0, -10.0), (3.0, 2.0), (0.0, 2.0)],
        colour: [0, 255, 0, 255],
    };
    let buf = rasterize(&genome(vec![tall], 4, 4));
    assert_eq!(&buf[(4 + 1) * 4..(4 + 1) * 4 + 4], &[0, 255, 0, 255]);
    assert_eq!(buf[(3 * 4 + 1) * 4 + 3], 0);
}
