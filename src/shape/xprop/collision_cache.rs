use super::BevelPlaneLut;
use crate::bounding_volume::{Aabb, BoundingVolume};
use crate::math::{Real, Rotation, Vector};
use crate::shape::CollisionModel;
use crate::utils;

/// Error raised when a prop's collision cache cannot be built.
#[derive(thiserror::Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum CollisionCacheError {
    /// None of the model's sections has a vertex.
    #[error("the collision model has no vertices")]
    EmptyModel,
}

/// Per-instance data of a placed collision model.
///
/// Built once per static or dynamic prop from its placement. The collision model itself is
/// shared between every prop using it, so it is not stored here and must be handed to the
/// trace together with this cache.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CollisionCache {
    inv_rotation: Rotation<Real>,
    inv_scale: Real,
    section_aabbs: Vec<Aabb>,
    section_bevel_luts: Vec<BevelPlaneLut>,
}

impl CollisionCache {
    /// Builds the cache of `model` placed at `origin` with the given `(pitch, yaw, roll)` angles
    /// (in degrees) and uniform scale.
    pub fn new(
        model: &CollisionModel,
        origin: &Vector<Real>,
        angles: &Vector<Real>,
        uniform_scale: Real,
    ) -> Result<Self, CollisionCacheError> {
        if model.sections().iter().all(|s| s.vertices().is_empty()) {
            return Err(CollisionCacheError::EmptyModel);
        }

        let inv_scale = 1.0 / uniform_scale;
        let transform = utils::transform_from_angles(origin, angles, uniform_scale);
        let rotation_scaling = utils::rotation_scaling(&transform);
        let inv_rotation = utils::rotation_from_angles(angles).inverse();

        let section_aabbs = model
            .sections()
            .iter()
            .map(|section| {
                Aabb::from_points(
                    section
                        .vertices()
                        .iter()
                        .map(|v| utils::transform_point(&transform, v)),
                )
            })
            .collect();

        let section_bevel_luts = model
            .sections()
            .iter()
            .zip(model.section_planes())
            .map(|(section, planes)| {
                BevelPlaneLut::new(&rotation_scaling, &inv_rotation, inv_scale, section, planes)
            })
            .collect();

        Ok(Self {
            inv_rotation,
            inv_scale,
            section_aabbs,
            section_bevel_luts,
        })
    }

    /// The inverse of the prop's rotation.
    #[inline]
    pub fn inv_rotation(&self) -> &Rotation<Real> {
        &self.inv_rotation
    }

    /// The inverse of the prop's uniform scale.
    #[inline]
    pub fn inv_scale(&self) -> Real {
        self.inv_scale
    }

    /// The world-space box of every section.
    #[inline]
    pub fn section_aabbs(&self) -> &[Aabb] {
        &self.section_aabbs
    }

    /// The bevel plane table of every section.
    #[inline]
    pub fn section_bevel_luts(&self) -> &[BevelPlaneLut] {
        &self.section_bevel_luts
    }

    /// The world-space box enclosing every section.
    pub fn aabb(&self) -> Aabb {
        self.section_aabbs
            .iter()
            .filter(|aabb| aabb.is_valid())
            .fold(Aabb::new_invalid(), |acc, aabb| acc.merged(aabb))
    }

    /// Number of bytes used by the bevel plane tables.
    pub fn bevel_lut_memory_size(&self) -> usize {
        self.section_bevel_luts
            .iter()
            .map(|lut| lut.memory_size())
            .sum()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::Point;
    use crate::shape::collision_model::test_utils::box_model;

    #[test]
    fn world_aabb_follows_placement() {
        let model = box_model(Point::new(0.0, -1.0, 0.0), Point::new(4.0, 1.0, 2.0));
        let cache = CollisionCache::new(
            &model,
            &Vector::new(100.0, 0.0, 10.0),
            &Vector::new(0.0, 90.0, 0.0),
            2.0,
        )
        .unwrap();

        let aabb = cache.aabb();
        assert_relative_eq!(aabb.mins, Point::new(98.0, 0.0, 10.0), epsilon = 1.0e-4);
        assert_relative_eq!(aabb.maxs, Point::new(102.0, 8.0, 14.0), epsilon = 1.0e-4);
        assert_eq!(cache.section_aabbs().len(), 1);
        assert_eq!(cache.section_bevel_luts().len(), 1);
        assert_eq!(cache.inv_scale(), 0.5);
        assert_relative_eq!(
            cache.inv_rotation() * Vector::y(),
            Vector::x(),
            epsilon = 1.0e-6
        );
    }

    #[test]
    fn empty_model_is_rejected() {
        let model = CollisionModel::new(vec![]);
        assert_eq!(
            CollisionCache::new(&model, &Vector::zeros(), &Vector::zeros(), 1.0),
            Err(CollisionCacheError::EmptyModel)
        );
    }
}
