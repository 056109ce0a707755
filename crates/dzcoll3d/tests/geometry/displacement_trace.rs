use crate::scene::{push_box_brush, push_displacement, set_world_brushes};
use dzcoll3d::bounding_volume::Aabb;
use dzcoll3d::math::{Point, Real, Vector};
use dzcoll3d::query::SweptTrace;
use dzcoll3d::shape::{BrushContents, CollisionModelLibrary, DispFlags};
use dzcoll3d::world::{CollidableWorld, MapGeometry, WorldBuildOptions};
use std::sync::Arc;

// A displacement on [0, 256]^2 next to a brush far away.
fn terrain_world(
    power: u32,
    flags: DispFlags,
    height: impl Fn(Real, Real) -> Real,
) -> CollidableWorld {
    let mut geometry = MapGeometry::default();
    push_displacement(&mut geometry, power, Point::origin(), 256.0, flags, height);
    let brush = push_box_brush(
        &mut geometry,
        Point::new(1000.0, 0.0, 0.0),
        Point::new(1064.0, 64.0, 64.0),
        BrushContents::SOLID,
    );
    set_world_brushes(&mut geometry, vec![brush]);
    CollidableWorld::build(
        Arc::new(geometry),
        &CollisionModelLibrary::new(),
        &WorldBuildOptions::default(),
    )
}

fn falling_hull(x: Real, y: Real) -> SweptTrace {
    SweptTrace::new_hull(
        Point::new(x, y, 100.0),
        Point::new(x, y, -10.0),
        Vector::new(-16.0, -16.0, 0.0),
        Vector::new(16.0, 16.0, 72.0),
    )
}

#[test]
fn hull_lands_on_flat_terrain() {
    let world = terrain_world(2, DispFlags::empty(), |_, _| 0.0);
    let mut trace = falling_hull(128.0, 128.0);
    world.swept_trace(&mut trace);

    assert!(trace.results.did_hit());
    assert!(!trace.results.startsolid);
    let hit_z = 100.0 - 110.0 * trace.results.fraction;
    assert_relative_eq!(hit_z, 0.0, epsilon = 0.1);
    assert_relative_eq!(trace.results.plane_normal, Vector::z(), epsilon = 1.0e-5);
}

#[test]
fn hull_lands_on_sloped_terrain() {
    // z = x / 4
    let world = terrain_world(3, DispFlags::empty(), |x, _| x * 0.25);
    let mut trace = falling_hull(128.0, 100.0);
    world.swept_trace(&mut trace);

    // The uphill edge of the bottom of the hull touches the slope first.
    let hit_z = 100.0 - 110.0 * trace.results.fraction;
    assert_relative_eq!(hit_z, 36.0, epsilon = 0.1);
    assert!(trace.results.plane_normal.z > 0.9);
    assert!(trace.results.plane_normal.x < 0.0);
}

#[test]
fn rays_and_no_hull_coll_terrain_are_not_hit() {
    let world = terrain_world(2, DispFlags::empty(), |_, _| 0.0);
    let mut ray = SweptTrace::new_ray(
        Point::new(128.0, 128.0, 100.0),
        Point::new(128.0, 128.0, -10.0),
    );
    world.swept_trace(&mut ray);
    assert!(!ray.results.did_hit());

    let world = terrain_world(2, DispFlags::NO_HULL_COLL, |_, _| 0.0);
    assert_eq!(world.displacement_trees().map(|trees| trees.len()), Some(0));
    let mut trace = falling_hull(128.0, 128.0);
    world.swept_trace(&mut trace);
    assert!(!trace.results.did_hit());
}

#[test]
fn terrain_overlap() {
    let world = terrain_world(4, DispFlags::empty(), |x, y| (x * 0.05).sin() * 10.0 + y * 0.1);

    let straddling = Aabb::new(Point::new(100.0, 100.0, -20.0), Point::new(110.0, 110.0, 40.0));
    let above = Aabb::new(Point::new(100.0, 100.0, 60.0), Point::new(110.0, 110.0, 80.0));
    let below = Aabb::new(Point::new(100.0, 100.0, -60.0), Point::new(110.0, 110.0, -30.0));
    let beside = Aabb::new(Point::new(300.0, 100.0, -20.0), Point::new(310.0, 110.0, 40.0));

    assert!(world.does_aabb_intersect_any_displacement(&straddling));
    assert!(!world.does_aabb_intersect_any_displacement(&above));
    assert!(!world.does_aabb_intersect_any_displacement(&below));
    assert!(!world.does_aabb_intersect_any_displacement(&beside));
}
