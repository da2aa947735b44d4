use crate::engine::genome::{Genome, Polygon};

/// Rasterize a genome onto a fresh black RGBA8 buffer.
///
/// Polygons are drawn in order with straight-alpha blending; covered pixels become opaque.
pub(crate) fn rasterize(genome: &Genome) -> Vec<u8> {
    let mut buf = vec![0u8; genome.width * genome.height * 4];
    for poly in &genome.polygons {
        fill_polygon(&mut buf, genome.width, genome.height, poly);
    }
    buf
}

struct Edge {
    y_max: i32,
    x: f32,
    inv_slope: f32,
}

fn fill_polygon(buf: &mut [u8], width: usize, height: usize, poly: &Polygon) {
    if poly.points.len() < 3 || width == 0 || height == 0 {
        return;
    }

    let pts: Vec<(i32, i32)> = poly
        .points
        .iter()
        .map(|&(x, y)| (x as i32, y as i32))
        .collect();

    let Some(y_lo) = pts.iter().map(|p| p.1).min() else {
        return;
    };
    let Some(y_hi) = pts.iter().map(|p| p.1).max() else {
        return;
    };
    let y_min = y_lo.max(0);
    let y_max = y_hi.min(height as i32 - 1);
    if y_min > y_max {
        return;
    }

    // Edge table bucketed by the scanline where each edge becomes active.
    let mut table: Vec<Vec<Edge>> = (y_min..=y_max).map(|_| Vec::new()).collect();
    for i in 0..pts.len() {
        let (x0, y0) = pts[i];
        let (x1, y1) = pts[(i + 1) % pts.len()];
        if y0 == y1 {
            continue;
        }
        let ((xl, yl), (xu, yu)) = if y0 < y1 {
            ((x0, y0), (x1, y1))
        } else {
            ((x1, y1), (x0, y0))
        };
        if yl >= height as i32 || yu < 0 {
            continue;
        }
        let inv_slope = (xu - xl) as f32 / (yu - yl) as f32;
        // Edges starting above the buffer are advanced to the first visible row.
        let start = yl.max(y_min);
        let x = xl as f32 + inv_slope * (start - yl) as f32;
        if let Some(bucket) = table.get_mut((start - y_min) as usize) {
            bucket.push(Edge {
                y_max: yu,
                x,
                inv_slope,
            });
        }
    }

    let alpha = poly.colour[3] as f32 / 255.0;
    let mut active: Vec<Edge> = Vec::new();
    for y in y_min..=y_max {
        active.append(&mut table[(y - y_min) as usize]);
        active.retain(|e| e.y_max > y);
        active.sort_by(|a, b| a.x.total_cmp(&b.x));

        for pair in active.chunks_exact(2) {
            let x_start = (pair[0].x.ceil() as i32).max(0);
            let x_end = (pair[1].x.floor() as i32).min(width as i32 - 1);
            for x in x_start..=x_end {
                let idx = (y as usize * width + x as usize) * 4;
                blend(&mut buf[idx..idx + 4], poly.colour, alpha);
            }
        }

        for e in &mut active {
            e.x += e.inv_slope;
        }
    }
}

#[inline]
fn blend(px: &mut [u8], colour: [u8; 4], alpha: f32) {
    let inv = 1.0 - alpha;
    for c in 0..3 {
        px[c] = (colour[c] as f32 * alpha + px[c] as f32 * inv) as u8;
    }
    px[3] = 255;
}

#[cfg(test)]
#[path = "../../tests/unit/engine/raster.rs"]
mod tests;
