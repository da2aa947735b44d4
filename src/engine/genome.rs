use rand::Rng;

const MIN_POINTS: usize = 3;
const MAX_POINTS: usize = 6;
const INITIAL_POLYGONS: usize = 50;
const MIN_POLYGONS: usize = 10;

const POINT_MOVE_DELTA: f32 = 5.0;
const POLYGON_MOVE_DELTA: f32 = 3.0;
const COLOUR_DELTA: i16 = 20;

/// One translucent polygon in image space.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Polygon {
    pub(crate) points: Vec<(f32, f32)>,
    pub(crate) colour: [u8; 4], // straight alpha
}

/// Candidate approximation: an ordered stack of polygons.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Genome {
    pub(crate) polygons: Vec<Polygon>,
    pub(crate) width: usize,
    pub(crate) height: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mutation {
    MovePoint,
    ChangeColour,
    MovePolygon,
    ReorderPolygon,
    AddPolygon,
    RemovePolygon,
    AddPoint,
    DeletePoint,
}

/// Cumulative selection weights; they sum to 1.0.
const MUTATION_WEIGHTS: [(Mutation, f32); 8] = [
    (Mutation::MovePoint, 0.30),
    (Mutation::ChangeColour, 0.30),
    (Mutation::MovePolygon, 0.15),
    (Mutation::ReorderPolygon, 0.10),
    (Mutation::AddPolygon, 0.05),
    (Mutation::RemovePolygon, 0.05),
    (Mutation::AddPoint, 0.03),
    (Mutation::DeletePoint, 0.02),
];

impl Mutation {
    pub(crate) fn pick<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut roll: f32 = rng.random_range(0.0..1.0);
        for (m, w) in MUTATION_WEIGHTS {
            if roll <= w {
                return m;
            }
            roll -= w;
        }
        Mutation::MovePoint
    }
}

impl Genome {
    pub(crate) fn random<R: Rng + ?Sized>(rng: &mut R, width: usize, height: usize) -> Self {
        Self {
            polygons: (0..INITIAL_POLYGONS)
                .map(|_| random_polygon(&mut *rng, width, height))
                .collect(),
            width,
            height,
        }
    }

    /// Apply one randomly chosen mutation in place.
    pub(crate) fn mutate<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.apply(Mutation::pick(rng), rng);
    }

    pub(crate) fn apply<R: Rng + ?Sized>(&mut self, m: Mutation, rng: &mut R) {
        let (w, h) = (self.width, self.height);
        match m {
            Mutation::MovePoint => {
                let Some(poly) = self.random_polygon_mut(rng) else {
                    return;
                };
                if poly.points.is_empty() {
                    return;
                }
                let i = rng.random_range(0..poly.points.len());
                let dx = rng.random_range(-POINT_MOVE_DELTA..=POINT_MOVE_DELTA);
                let dy = rng.random_range(-POINT_MOVE_DELTA..=POINT_MOVE_DELTA);
                let (x, y) = poly.points[i];
                poly.points[i] = clamp_point(x + dx, y + dy, w, h);
            }
            Mutation::ChangeColour => {
                let Some(poly) = self.random_polygon_mut(rng) else {
                    return;
                };
                let ch: usize = rng.random_range(0..4);
                let delta = rng.random_range(-COLOUR_DELTA..=COLOUR_DELTA);
                poly.colour[ch] = (poly.colour[ch] as i16 + delta).clamp(0, 255) as u8;
            }
            Mutation::MovePolygon => {
                let Some(poly) = self.random_polygon_mut(rng) else {
                    return;
                };
                let dx = rng.random_range(-POLYGON_MOVE_DELTA..=POLYGON_MOVE_DELTA);
                let dy = rng.random_range(-POLYGON_MOVE_DELTA..=POLYGON_MOVE_DELTA);
                for p in &mut poly.points {
                    *p = clamp_point(p.0 + dx, p.1 + dy, w, h);
                }
            }
            Mutation::ReorderPolygon => {
                if self.polygons.len() < 2 {
                    return;
                }
                let a = rng.random_range(0..self.polygons.len());
                let b = rng.random_range(0..self.polygons.len());
                self.polygons.swap(a, b);
            }
            Mutation::AddPolygon => {
                let poly = random_polygon(rng, w, h);
                self.polygons.push(poly);
            }
            Mutation::RemovePolygon => {
                if self.polygons.len() > MIN_POLYGONS {
                    let i = rng.random_range(0..self.polygons.len());
                    self.polygons.remove(i);
                }
            }
            Mutation::AddPoint => {
                let p = random_point(rng, w, h);
                if let Some(poly) = self.random_polygon_mut(rng) {
                    poly.points.push(p);
                }
            }
            Mutation::DeletePoint => {
                let Some(poly) = self.random_polygon_mut(rng) else {
                    return;
                };
                if poly.points.len() > MIN_POINTS {
                    let i = rng.random_range(0..poly.points.len());
                    poly.points.remove(i);
                }
            }
        }
    }

    fn random_polygon_mut<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&mut Polygon> {
        if self.polygons.is_empty() {
            return None;
        }
        let i = rng.random_range(0..self.polygons.len());
        self.polygons.get_mut(i)
    }
}

fn random_polygon<R: Rng + ?Sized>(rng: &mut R, width: usize, height: usize) -> Polygon {
    let n = rng.random_range(MIN_POINTS..=MAX_POINTS);
    Polygon {
        points: (0..n).map(|_| random_point(&mut *rng, width, height)).collect(),
        colour: [
            rng.random_range(0..=255),
            rng.random_range(0..=255),
            rng.random_range(0..=255),
            rng.random_range(30..=150),
        ],
    }
}

fn random_point<R: Rng + ?Sized>(rng: &mut R, width: usize, height: usize) -> (f32, f32) {
    (
        rng.random_range(0.0..width.max(1) as f32),
        rng.random_range(0.0..height.max(1) as f32),
    )
}

fn clamp_point(x: f32, y: f32, width: usize, height: usize) -> (f32, f32) {
    (
        x.clamp(0.0, (width.max(1) - 1) as f32),
        y.clamp(0.0, (height.max(1) - 1) as f32),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/engine/genome.rs"]
mod tests;
