use crate::scene::{library, random_hull_trace, random_scene, random_trace};
use dzcoll3d::query::{compare_trace_results, SweptTrace};
use dzcoll3d::world::{CollidableWorld, WorldBuildOptions};
use std::sync::Arc;

fn assert_bvh_matches_brute_force(world: &CollidableWorld, trace: SweptTrace) -> bool {
    let mut accelerated = trace;
    world.swept_trace(&mut accelerated);
    let mut brute_force = trace;
    world.brute_force_swept_trace(&mut brute_force);

    assert!(
        compare_trace_results(&trace.info, &brute_force.results, &accelerated.results),
        "start {:?}, delta {:?}, extents {:?}: brute force {:?}, bvh {:?}",
        trace.info.startpos,
        trace.info.delta,
        trace.info.extents,
        brute_force.results,
        accelerated.results,
    );
    accelerated.results.did_hit()
}

#[test]
fn bvh_traces_match_brute_force_traces() {
    let mut rng = oorandom::Rand32::new(42);
    let library = library();

    for _ in 0..3 {
        let geometry = Arc::new(random_scene(&mut rng));
        let world = CollidableWorld::build(geometry, &library, &WorldBuildOptions::default());
        let bvh = world.bvh().unwrap();
        bvh.assert_well_formed();

        let mut num_hits = 0;
        for _ in 0..300 {
            if assert_bvh_matches_brute_force(&world, random_trace(&mut rng)) {
                num_hits += 1;
            }
        }

        // Make sure the comparison is not only about misses.
        assert!(num_hits > 0);
    }
}

// Hulls grazing rotated func_brushes must not hit outside the brush bounds, where the BVH
// would prune them.
#[test]
fn hull_traces_match_brute_force_across_seeds() {
    let library = library();

    for seed in [7, 42, 1234, 9001] {
        let mut rng = oorandom::Rand32::new(seed);
        let geometry = Arc::new(random_scene(&mut rng));
        let world = CollidableWorld::build(geometry, &library, &WorldBuildOptions::default());

        let mut num_hits = 0;
        for _ in 0..1500 {
            if assert_bvh_matches_brute_force(&world, random_hull_trace(&mut rng)) {
                num_hits += 1;
            }
        }
        assert!(num_hits > 0);
    }
}
