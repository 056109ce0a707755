//! Brush entities placed with their own orientation and origin.

use crate::bounding_volume::Aabb;
use crate::math::{Real, Vector};
use crate::query::details::{pushed_out_plane_dist, SweptClip};
use crate::query::SweptTrace;
use crate::shape::{BrushCategory, BrushTables};
use crate::utils;

/// Error raised when a brush entity does not reference a valid brush model.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum ModelRefError {
    /// The model name does not start with `*`.
    #[error("model `{0}` is not a brush model reference")]
    NotABrushModel(String),
    /// The model index is not a number, is the world model, or is out of bounds.
    #[error("brush model index `{0}` is invalid")]
    InvalidIndex(String),
}

/// The solidity setting of a func_brush.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum FuncBrushSolidity {
    /// Solid unless disabled at spawn.
    #[default]
    Toggle,
    /// Never solid.
    Never,
    /// Always solid.
    Always,
}

impl FuncBrushSolidity {
    /// Converts the raw entity key value. Unknown values behave like `Toggle`.
    pub fn from_raw(solidity: i16) -> Self {
        match solidity {
            1 => Self::Never,
            2 => Self::Always,
            _ => Self::Toggle,
        }
    }
}

/// A `func_brush` entity.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct FuncBrush {
    /// Brush model reference, `"*N"`.
    pub model: String,
    /// Position of the entity.
    pub origin: Vector<Real>,
    /// Orientation `(pitch, yaw, roll)` in degrees.
    pub angles: Vector<Real>,
    /// Solidity setting.
    pub solidity: FuncBrushSolidity,
    /// Is the entity disabled at spawn?
    pub start_disabled: bool,
}

impl FuncBrush {
    /// Does this entity block movement?
    pub fn is_solid(&self) -> bool {
        match self.solidity {
            FuncBrushSolidity::Never => false,
            FuncBrushSolidity::Always => true,
            FuncBrushSolidity::Toggle => !self.start_disabled,
        }
    }

    /// The index of the brush model of this entity, given the number of brush models.
    ///
    /// Model 0 is the world and cannot be referenced by an entity.
    pub fn model_index(&self, num_models: usize) -> Result<usize, ModelRefError> {
        let idx_str = self
            .model
            .strip_prefix('*')
            .ok_or_else(|| ModelRefError::NotABrushModel(self.model.clone()))?;

        match idx_str.parse::<usize>() {
            Ok(idx) if idx > 0 && idx < num_models => Ok(idx),
            _ => Err(ModelRefError::InvalidIndex(idx_str.to_string())),
        }
    }

    /// The world-space box enclosing every brush of this entity's model.
    ///
    /// Brushes of every category are included. Returns `None` if the model is invalid or
    /// has no vertices.
    pub fn aabb(&self, tables: &BrushTables) -> Option<Aabb> {
        let model = self.model_index(tables.models.len()).ok()?;
        let transform = utils::transform_from_angles(&self.origin, &self.angles, 1.0);

        let mut result = Aabb::new_invalid();
        let mut any_vertex = false;
        for (_, brush) in tables.model_brushes(model) {
            for v in brush.vertices(tables.brush_sides, tables.planes) {
                result.take_point(utils::transform_point(&transform, &v));
                any_vertex = true;
            }
        }

        any_vertex.then_some(result)
    }
}

/// Sweeps `trace` against every brush of a func_brush entity.
///
/// Only brushes solid to the player are tested, and grenade clips never are. Each brush is
/// clipped independently: a brush entirely in front of one of its planes is skipped, and a
/// start inside a brush flags `startsolid` without stopping the other brushes. Hulls are also
/// clipped against the axial bounds of each rotated brush. Hits commit the fraction and the
/// rotated plane normal, but not the surface.
pub fn swept_trace_func_brush(
    trace: &mut SweptTrace,
    func_brush: &FuncBrush,
    tables: &BrushTables,
) {
    if !func_brush.is_solid() {
        return;
    }

    let Ok(model) = func_brush.model_index(tables.models.len()) else {
        return;
    };

    let rotation = utils::rotation_matrix_from_angles(&func_brush.angles);
    let start = trace.info.startpos - func_brush.origin;
    let end = start + trace.info.delta;

    for (_, brush) in tables.model_brushes(model) {
        if brush.is_in_category(BrushCategory::GrenadeClip) || !brush.is_solid_to_player() {
            continue;
        }

        let mut clip = SweptClip::new();
        let mut missed = false;

        for side in brush.sides(tables.brush_sides) {
            if trace.info.isray && side.bevel {
                continue;
            }
            let Some(plane) = tables.planes.get(side.plane_num as usize) else {
                continue;
            };

            let normal = rotation * plane.normal;
            let dist = if trace.info.isray {
                plane.dist
            } else {
                pushed_out_plane_dist(&normal, plane.dist, &trace.info.extents)
            };

            let d1 = start.coords.dot(&normal) - dist;
            let d2 = end.coords.dot(&normal) - dist;

            if !clip.clip(d1, d2, || normal) {
                missed = true;
                break;
            }
        }

        if missed {
            continue;
        }

        // Rotated brushes lose their axial bevels. Clip hulls against the axial planes of
        // the rotated brush bounds so they cannot hit the extensions of slanted faces.
        if !trace.info.isray {
            let vertices = brush.vertices(tables.brush_sides, tables.planes);
            let bounds = Aabb::from_points(vertices.into_iter().map(|v| rotation * v));

            if bounds.is_valid() {
                for i in 0..3 {
                    let mut normal = Vector::zeros();
                    for (sign, plane_dist) in [(1.0, bounds.maxs[i]), (-1.0, -bounds.mins[i])] {
                        normal[i] = sign;
                        let dist = plane_dist + trace.info.extents[i];
                        let d1 = sign * start[i] - dist;
                        let d2 = sign * end[i] - dist;

                        if !clip.clip(d1, d2, || normal) {
                            missed = true;
                            break;
                        }
                    }
                    if missed {
                        break;
                    }
                }
            }

            if missed {
                continue;
            }
        }

        if let Some((fraction, normal)) = clip.finish(&mut trace.results) {
            trace.results.fraction = fraction;
            trace.results.plane_normal = normal;
        }
    }
}
