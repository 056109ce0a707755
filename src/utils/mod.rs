//! Various unsorted geometrical and logical operators.

pub use self::angles::{
    rotation_from_angles, rotation_matrix_from_angles, rotation_scaling, transform_from_angles,
    transform_point,
};
pub use self::normalize::{normalize_in_place, normalized_or_zero};
pub use self::sorted_pair::SortedPair;

mod angles;
mod normalize;
mod sorted_pair;
