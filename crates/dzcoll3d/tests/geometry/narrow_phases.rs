use crate::scene::{library, random_hull_trace, random_scene};
use dzcoll3d::debug::NoopObserver;
use dzcoll3d::math::Real;
use dzcoll3d::shape::{swept_trace_brush, swept_trace_func_brush, swept_trace_xprop};
use dzcoll3d::world::{CollidableWorld, WorldBuildOptions};
use std::sync::Arc;

// Every narrow phase may only lower the fraction of a trace shared with the others.
#[test]
fn fraction_only_decreases() {
    let mut rng = oorandom::Rand32::new(42);
    let geometry = Arc::new(random_scene(&mut rng));
    let world = CollidableWorld::build(geometry.clone(), &library(), &WorldBuildOptions::default());
    let tables = geometry.brush_tables();
    let disp_trees = world.displacement_trees().unwrap();

    let num_steps = geometry
        .brushes
        .len()
        .max(geometry.func_brushes.len())
        .max(disp_trees.len())
        .max(geometry.static_props.len());

    let mut num_hits = 0;
    for _ in 0..200 {
        let mut trace = random_hull_trace(&mut rng);
        let mut last: Real = 1.0;
        let mut check = |fraction: Real| {
            assert!(fraction <= last);
            assert!((0.0..=1.0).contains(&fraction));
            last = fraction;
        };

        for i in 0..num_steps {
            if let Some(brush) = geometry.brushes.get(i) {
                swept_trace_brush(&mut trace, brush, &geometry.brush_sides, &geometry.planes);
                check(trace.results.fraction);
            }
            if let Some(func_brush) = geometry.func_brushes.get(i) {
                swept_trace_func_brush(&mut trace, func_brush, &tables);
                check(trace.results.fraction);
            }
            if let Some(tree) = disp_trees.get(i) {
                let _ = tree.sweep_aabb(&mut trace, &mut NoopObserver);
                check(trace.results.fraction);
            }
            if let (Some(prop), Some(collision)) = (
                geometry.static_props.get(i),
                world.static_prop_collision(i as u32),
            ) {
                swept_trace_xprop(&mut trace, &prop.origin, &collision.model, &collision.cache);
                check(trace.results.fraction);
            }
        }

        if trace.results.did_hit() {
            num_hits += 1;
        }
    }

    assert!(num_hits > 0);
}
