use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::*;

#[test]
fn random_genome_respects_bounds() {
    let mut rng = Pcg32::seed_from_u64(7);
    let g = Genome::random(&mut rng, 20, 10);
    assert_eq!(g.polygons.len(), INITIAL_POLYGONS);
    for p in &g.polygons {
        assert!((MIN_POINTS..=MAX_POINTS).contains(&p.points.len()));
        assert!((30..=150).contains(&p.colour[3]));
        for &(x, y) in &p.points {
            assert!((0.0..20.0).contains(&x));
            assert!((0.0..10.0).contains(&y));
        }
    }
}

#[test]
fn mutations_keep_points_inside_the_canvas() {
    let mut rng = Pcg32::seed_from_u64(11);
    let mut g = Genome::random(&mut rng, 16, 16);
    for _ in 0..2_000 {
        g.mutate(&mut rng);
    }
    assert!(g.polygons.len() >= MIN_POLYGONS);
    for p in &g.polygons {
        assert!(p.points.len() >= MIN_POINTS);
        for &(x, y) in &p.points {
            assert!((0.0..16.0).contains(&x) && (0.0..16.0).contains(&y));
        }
    }
}

#[test]
fn remove_polygon_stops_at_minimum() {
    let mut rng = Pcg32::seed_from_u64(3);
    let mut g = Genome::random(&mut rng, 8, 8);
    for _ in 0..500 {
        g.apply(Mutation::RemovePolygon, &mut rng);
    }
    assert_eq!(g.polygons.len(), MIN_POLYGONS);
}

#[test]
fn delete_point_keeps_triangles() {
    let mut rng = Pcg32::seed_from_u64(5);
    let mut g = Genome::random(&mut rng, 8, 8);
    for _ in 0..2_000 {
        g.apply(Mutation::DeletePoint, &mut rng);
    }
    assert!(g.polygons.iter().all(|p| p.points.len() == MIN_POINTS));
}

#[test]
fn weights_cover_every_mutation() {
    let total: f32 = MUTATION_WEIGHTS.iter().map(|(_, w)| w).sum();
    assert!((total - 1.0).abs() < 1e-5);

    let mut rng = Pcg32::seed_from_u64(1);
    let mut seen = std::collections::HashSet::new();
    for _ in 0..20_000 {
        seen.insert(format!("{:?}", Mutation::pick(&mut rng)));
    }
    assert_eq!(seen.len(), MUTATION_WEIGHTS.len());
}

#[test]
fn seeded_generation_is_deterministic() {
    let a = Genome::random(&mut Pcg32::seed_from_u64(9), 12, 12);
    let b = Genome::random(&mut Pcg32::seed_from_u64(9), 12, 12);
    assert_eq!(a, b);
}
