use crate::scene::{push_box_brush, set_world_brushes};
use dzcoll3d::math::{Point, Vector};
use dzcoll3d::query::{SweptTrace, DIST_EPSILON};
use dzcoll3d::shape::{BrushContents, CollisionModelLibrary};
use dzcoll3d::world::{CollidableWorld, MapGeometry, WorldBuildOptions};
use std::sync::Arc;

// The box [0, 64]^3 and a second box far away, so the world has a BVH.
fn box_world() -> CollidableWorld {
    let mut geometry = MapGeometry::default();
    let a = push_box_brush(
        &mut geometry,
        Point::new(0.0, 0.0, 0.0),
        Point::new(64.0, 64.0, 64.0),
        BrushContents::SOLID,
    );
    let b = push_box_brush(
        &mut geometry,
        Point::new(1000.0, 1000.0, 1000.0),
        Point::new(1064.0, 1064.0, 1064.0),
        BrushContents::SOLID,
    );
    set_world_brushes(&mut geometry, vec![a, b]);
    CollidableWorld::build(
        Arc::new(geometry),
        &CollisionModelLibrary::new(),
        &WorldBuildOptions::default(),
    )
}

#[test]
fn ray_hits_the_top_face() {
    let world = box_world();
    let mut trace = SweptTrace::new_ray(Point::new(32.0, 32.0, 100.0), Point::new(32.0, 32.0, 0.0));
    world.swept_trace(&mut trace);

    assert_relative_eq!(trace.results.fraction, (36.0 - DIST_EPSILON) / 100.0);
    assert_eq!(trace.results.plane_normal, Vector::z());
    // Sides are +x, -x, +y, -y, +z, -z.
    assert_eq!(trace.results.surface, 4);
    assert!(!trace.results.startsolid);
    assert!(!trace.results.allsolid);
}

#[test]
fn long_ray_hits_at_the_same_height() {
    let world = box_world();
    let mut trace = SweptTrace::new_ray(
        Point::new(32.0, 32.0, 100.0),
        Point::new(32.0, 32.0, -100.0),
    );
    world.swept_trace(&mut trace);

    let hit_z = 100.0 - 200.0 * trace.results.fraction;
    assert_relative_eq!(hit_z, 64.0 + DIST_EPSILON, epsilon = 1.0e-4);
    assert_eq!(trace.results.plane_normal, Vector::z());
}

#[test]
fn hull_inside_the_box_starts_solid() {
    let world = box_world();
    let mut trace = SweptTrace::new_hull(
        Point::new(32.0, 32.0, 32.0),
        Point::new(32.0, 32.0, 40.0),
        Vector::new(-16.0, -16.0, -36.0),
        Vector::new(16.0, 16.0, 36.0),
    );
    world.swept_trace(&mut trace);

    assert!(trace.results.startsolid);
    assert!(trace.results.allsolid);
}

#[test]
fn ray_leaving_the_box_starts_solid() {
    let world = box_world();
    let mut trace = SweptTrace::new_ray(
        Point::new(32.0, 32.0, 32.0),
        Point::new(32.0, 32.0, 200.0),
    );
    world.swept_trace(&mut trace);

    assert!(trace.results.startsolid);
    assert!(!trace.results.allsolid);
}

#[test]
fn sweeps_through_empty_space_do_not_hit() {
    let world = box_world();
    let mut rng = oorandom::Rand32::new(42);

    for _ in 0..100 {
        // Entirely above both boxes.
        let start = Point::new(
            rng.rand_float() * 2000.0 - 500.0,
            rng.rand_float() * 2000.0 - 500.0,
            1200.0 + rng.rand_float() * 500.0,
        );
        let end = Point::new(
            rng.rand_float() * 2000.0 - 500.0,
            rng.rand_float() * 2000.0 - 500.0,
            1200.0 + rng.rand_float() * 500.0,
        );
        let mut trace = SweptTrace::new_hull(
            start,
            end,
            Vector::new(-16.0, -16.0, 0.0),
            Vector::new(16.0, 16.0, 72.0),
        );
        world.swept_trace(&mut trace);

        assert_eq!(trace.results.fraction, 1.0);
        assert!(!trace.results.startsolid);
        assert!(!trace.results.allsolid);
        assert!(!trace.results.did_hit());
    }
}
