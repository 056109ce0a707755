use crate::scene::{box_model, push_box_brush, push_displacement, set_world_brushes};
use dzcoll3d::bounding_volume::Aabb;
use dzcoll3d::math::{Point, Vector};
use dzcoll3d::partitioning::{BvhBuildError, LeafKind};
use dzcoll3d::query::SweptTrace;
use dzcoll3d::shape::{BrushContents, CollisionModelLibrary, DispFlags};
use dzcoll3d::world::{CollidableWorld, MapGeometry, StaticProp, WorldBuildOptions};
use std::sync::Arc;

const CRATE_MODEL: &str = "models/props/crate.mdl";

fn library() -> CollisionModelLibrary {
    let mut library = CollisionModelLibrary::new();
    library.insert(
        CRATE_MODEL,
        box_model(Point::new(-16.0, -16.0, 0.0), Point::new(16.0, 16.0, 32.0)),
    );
    library
}

// One solid brush, one flat displacement and three static props: a solid one, a non-solid one
// and one with an unknown model.
fn geometry() -> MapGeometry {
    let mut geometry = MapGeometry::default();
    let brush = push_box_brush(
        &mut geometry,
        Point::new(0.0, 0.0, 0.0),
        Point::new(64.0, 64.0, 64.0),
        BrushContents::SOLID,
    );
    set_world_brushes(&mut geometry, vec![brush]);
    push_displacement(
        &mut geometry,
        2,
        Point::new(200.0, 0.0, 0.0),
        128.0,
        DispFlags::empty(),
        |_, _| 0.0,
    );

    for (x, solid, model) in [
        (400.0, 6, CRATE_MODEL),
        (500.0, 0, CRATE_MODEL),
        (600.0, 6, "models/props/missing.mdl"),
    ] {
        geometry.static_props.push(StaticProp {
            model: model.to_string(),
            origin: Vector::new(x, 0.0, 0.0),
            solid,
            ..Default::default()
        });
    }
    geometry
}

fn leaf_kinds(world: &CollidableWorld) -> Vec<(LeafKind, u32)> {
    world
        .bvh()
        .unwrap()
        .leaves()
        .iter()
        .map(|leaf| (leaf.kind, leaf.index))
        .collect()
}

#[test]
fn empty_worlds_do_not_collide() {
    let world = CollidableWorld::build(
        Arc::new(MapGeometry::default()),
        &CollisionModelLibrary::new(),
        &WorldBuildOptions::default(),
    );
    assert!(world.bvh().is_none());

    let mut trace = SweptTrace::new_hull(
        Point::new(0.0, 0.0, 100.0),
        Point::new(0.0, 0.0, -100.0),
        Vector::repeat(-16.0),
        Vector::repeat(16.0),
    );
    let before = trace;
    world.swept_trace(&mut trace);
    assert_eq!(trace, before);

    let everywhere = Aabb::new(Point::from(Vector::repeat(-1.0e5)), Point::from(Vector::repeat(1.0e5)));
    assert!(!world.does_aabb_intersect_any_displacement(&everywhere));
    assert!(world.aabbs_containing_point(&Point::origin()).is_empty());
}

#[test]
fn a_single_object_is_not_enough_for_a_bvh() {
    let mut geometry = MapGeometry::default();
    let brush = push_box_brush(
        &mut geometry,
        Point::new(0.0, 0.0, 0.0),
        Point::new(64.0, 64.0, 64.0),
        BrushContents::SOLID,
    );
    set_world_brushes(&mut geometry, vec![brush]);

    let mut world = CollidableWorld::build(
        Arc::new(geometry),
        &CollisionModelLibrary::new(),
        &WorldBuildOptions::default(),
    );
    assert!(world.bvh().is_none());
    assert_eq!(world.build_bvh(), Err(BvhBuildError::TooFewLeaves(1)));

    let mut trace = SweptTrace::new_ray(Point::new(32.0, 32.0, 100.0), Point::new(32.0, 32.0, 0.0));
    world.swept_trace(&mut trace);
    assert!(!trace.results.did_hit());
}

#[test]
fn only_solid_props_with_models_are_collidable() {
    let world = CollidableWorld::build(
        Arc::new(geometry()),
        &library(),
        &WorldBuildOptions::default(),
    );

    assert!(world.static_prop_collision(0).is_some());
    assert!(world.static_prop_collision(1).is_none());
    assert!(world.static_prop_collision(2).is_none());
    assert_eq!(
        leaf_kinds(&world),
        vec![
            (LeafKind::Brush, 0),
            (LeafKind::Displacement, 0),
            (LeafKind::StaticProp, 0),
        ]
    );

    let mut trace = SweptTrace::new_ray(Point::new(400.0, 0.0, 100.0), Point::new(400.0, 0.0, 0.0));
    world.swept_trace(&mut trace);
    assert!(trace.results.did_hit());

    let mut trace = SweptTrace::new_ray(Point::new(500.0, 0.0, 100.0), Point::new(500.0, 0.0, 0.0));
    world.swept_trace(&mut trace);
    assert!(!trace.results.did_hit());
}

#[test]
fn build_options_leave_out_object_kinds() {
    let options = WorldBuildOptions {
        displacements: false,
        ..Default::default()
    };
    let world = CollidableWorld::build(Arc::new(geometry()), &library(), &options);
    assert_eq!(world.displacement_trees().map(|trees| trees.len()), Some(0));
    assert_eq!(
        leaf_kinds(&world),
        vec![(LeafKind::Brush, 0), (LeafKind::StaticProp, 0)]
    );

    let hull_on_terrain = Aabb::new(Point::new(250.0, 50.0, -8.0), Point::new(282.0, 82.0, 64.0));
    assert!(!world.does_aabb_intersect_any_displacement(&hull_on_terrain));

    let options = WorldBuildOptions {
        static_props: false,
        ..Default::default()
    };
    let world = CollidableWorld::build(Arc::new(geometry()), &library(), &options);
    assert!(world.static_prop_collision(0).is_none());
    assert_eq!(
        leaf_kinds(&world),
        vec![(LeafKind::Brush, 0), (LeafKind::Displacement, 0)]
    );
    assert!(world.does_aabb_intersect_any_displacement(&hull_on_terrain));
}

#[test]
fn collision_data_can_be_built_step_by_step() {
    let mut world = CollidableWorld::new(Arc::new(geometry()));
    assert_eq!(
        world.build_bvh(),
        Err(BvhBuildError::MissingDisplacementTrees)
    );

    world.build_displacement_trees();
    world.build_static_prop_caches(&library(), false);
    assert_eq!(world.build_bvh(), Err(BvhBuildError::MissingPropCaches));

    world.build_dynamic_prop_caches(&library(), false);
    assert_eq!(world.build_bvh(), Ok(()));
    assert_eq!(world.bvh().map(|bvh| bvh.leaves().len()), Some(3));
}
