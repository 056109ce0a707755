use crate::math::{Real, Vector};

/// Normalizes `v` in place and returns its original length.
///
/// A small epsilon is added to the length so that zero vectors stay zero instead of turning
/// into NaNs. The result is thus very slightly shorter than a unit vector.
#[inline]
pub fn normalize_in_place(v: &mut Vector<Real>) -> Real {
    let length = v.norm();
    *v *= 1.0 / (length + Real::EPSILON);
    length
}

/// Returns `v` normalized the way [`normalize_in_place`] does.
#[inline]
pub fn normalized_or_zero(v: &Vector<Real>) -> Vector<Real> {
    let mut result = *v;
    let _ = normalize_in_place(&mut result);
    result
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_stays_zero() {
        let mut v = Vector::zeros();
        assert_eq!(normalize_in_place(&mut v), 0.0);
        assert_eq!(v, Vector::zeros());
    }

    #[test]
    fn unit_length() {
        let v = normalized_or_zero(&Vector::new(3.0, 0.0, 4.0));
        assert_relative_eq!(v, Vector::new(0.6, 0.0, 0.8), epsilon = 1.0e-6);
    }
}
