use dzcoll3d::bounding_volume::{aabb_intersects_aabb, Aabb, BoundingVolume};
use dzcoll3d::math::{Point, Real, Vector};

fn random_aabb(rng: &mut oorandom::Rand32) -> Aabb {
    let center = Point::new(
        rng.rand_float() * 100.0 - 50.0,
        rng.rand_float() * 100.0 - 50.0,
        rng.rand_float() * 100.0 - 50.0,
    );
    let half_extents = Vector::new(
        rng.rand_float() * 20.0,
        rng.rand_float() * 20.0,
        rng.rand_float() * 20.0,
    );
    Aabb::from_half_extents(center, half_extents)
}

#[test]
fn overlap_is_symmetric_and_matches_the_bounding_volume_test() {
    let mut rng = oorandom::Rand32::new(42);

    for _ in 0..1000 {
        let a = random_aabb(&mut rng);
        let b = random_aabb(&mut rng);

        let ab = aabb_intersects_aabb(&a.mins, &a.maxs, &b.mins, &b.maxs);
        let ba = aabb_intersects_aabb(&b.mins, &b.maxs, &a.mins, &a.maxs);
        assert_eq!(ab, ba);
        assert_eq!(ab, a.intersects(&b));

        // Every box overlaps itself and the boxes containing it.
        assert!(aabb_intersects_aabb(&a.mins, &a.maxs, &a.mins, &a.maxs));
        let merged = a.merged(&b);
        assert!(aabb_intersects_aabb(&a.mins, &a.maxs, &merged.mins, &merged.maxs));
    }
}

#[test]
fn touching_boxes_overlap() {
    let a = Aabb::new(Point::origin(), Point::new(1.0, 1.0, 1.0));
    let offsets: [Real; 3] = [1.0, 1.0 + 1.0e-3, -1.0];

    for axis in 0..3 {
        for offset in offsets {
            let mut shift = Vector::zeros();
            shift[axis] = offset;
            let b = Aabb::new(a.mins + shift, a.maxs + shift);
            let expected = offset.abs() <= 1.0;
            assert_eq!(
                aabb_intersects_aabb(&a.mins, &a.maxs, &b.mins, &b.maxs),
                expected
            );
        }
    }
}
