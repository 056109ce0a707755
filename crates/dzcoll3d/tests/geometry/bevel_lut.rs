use crate::scene::{box_model, pyramid_model};
use dzcoll3d::math::{Point, Real, Vector};
use dzcoll3d::shape::{BevelPlaneLut, CollisionCache};

#[test]
fn candidate_indices_are_sorted_and_unique() {
    let mut rng = oorandom::Rand32::new(42);

    for len in 0..50 {
        let indices: Vec<usize> = (0..len)
            .map(|_| rng.rand_range(0..2000) as usize)
            .collect();
        let lut = BevelPlaneLut::from_candidate_indices(indices.clone());

        let mut expected = indices;
        expected.sort_unstable();
        expected.dedup();
        assert_eq!(lut.candidate_indices().collect::<Vec<_>>(), expected);
        assert!(lut.memory_size() >= expected.len());
    }
}

#[test]
fn axis_aligned_props_have_no_bevels() {
    let model = box_model(Point::new(-16.0, -16.0, 0.0), Point::new(16.0, 16.0, 64.0));

    for yaw in [0.0, 90.0, 180.0, 270.0] {
        let angles = Vector::new(0.0, yaw, 0.0);
        let cache =
            CollisionCache::new(&model, &Vector::new(10.0, 20.0, 30.0), &angles, 1.5).unwrap();
        assert_eq!(cache.section_bevel_luts().len(), 1);
        assert_eq!(cache.bevel_lut_memory_size(), 0);
    }
}

#[test]
fn bevels_never_cut_into_the_prop() {
    let mut rng = oorandom::Rand32::new(42);
    let model = pyramid_model(24.0, 48.0);
    let section = &model.sections()[0];

    let mut num_bevels = 0;
    for _ in 0..50 {
        let angles = Vector::new(
            rng.rand_float() * 360.0,
            rng.rand_float() * 360.0,
            rng.rand_float() * 360.0,
        );
        let scale: Real = 0.5 + rng.rand_float() * 2.0;
        let cache = CollisionCache::new(&model, &Vector::zeros(), &angles, scale).unwrap();
        let lut = &cache.section_bevel_luts()[0];

        for plane in lut.planes(section, cache.inv_rotation()) {
            num_bevels += 1;
            assert_relative_eq!(plane.normal.norm(), 1.0, epsilon = 1.0e-4);
            for v in section.vertices() {
                assert!(plane.signed_dist(v) <= 0.1 + 1.0e-3);
            }
        }
    }

    // Random orientations leave most pyramid edges slanted.
    assert!(num_bevels > 0);
}
