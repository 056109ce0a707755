//! Convex brushes: volumes bounded by planes.

use crate::bounding_volume::Aabb;
use crate::math::{Matrix, Point, Real, Vector};
use crate::query::details::{pushed_out_plane_dist, SweptClip};
use crate::query::SweptTrace;

/// A plane `{x | dot(normal, x) == dist}`. Brush planes face out of the brush.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Plane {
    /// The unit normal of the plane.
    pub normal: Vector<Real>,
    /// The distance of the plane to the origin, along `normal`.
    pub dist: Real,
}

impl Plane {
    /// Creates a new plane.
    #[inline]
    pub fn new(normal: Vector<Real>, dist: Real) -> Self {
        Self { normal, dist }
    }

    /// Signed distance of `pt` to this plane. Positive in front of the plane.
    #[inline]
    pub fn signed_dist(&self, pt: &Point<Real>) -> Real {
        pt.coords.dot(&self.normal) - self.dist
    }
}

/// The content flags of a brush.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BrushContents(u32);

bitflags::bitflags! {
    impl BrushContents: u32 {
        /// Solid.
        const SOLID = 1 << 0;
        /// Translucent, but not watery.
        const WINDOW = 1 << 1;
        /// Alpha-tested "grate" textures.
        const GRATE = 1 << 3;
        /// Water.
        const WATER = 1 << 5;
        /// Hits world but not other moveables.
        const MOVEABLE = 1 << 14;
        /// Blocks players only.
        const PLAYERCLIP = 1 << 16;
        /// Blocks grenades only.
        const GRENADECLIP = 1 << 19;
        /// Blocks drones only.
        const DRONECLIP = 1 << 20;
        /// Debris.
        const DEBRIS = 1 << 26;
        /// Detail brushes, not part of the visibility tree.
        const DETAIL = 1 << 27;
        /// Ladders.
        const LADDER = 1 << 29;
        /// Hitboxes.
        const HITBOX = 1 << 30;
    }
}

/// Functional classification of brushes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum BrushCategory {
    /// Regular solid geometry (solid, grate or window, but not water nor ladder).
    Solid,
    /// Blocks players only.
    PlayerClip,
    /// Blocks grenades only.
    GrenadeClip,
    /// Climbable ladders.
    Ladder,
    /// Water volumes.
    Water,
}

impl BrushCategory {
    /// Categories solid to a player's hull.
    pub const SOLID_TO_PLAYER: [BrushCategory; 3] = [
        BrushCategory::Solid,
        BrushCategory::PlayerClip,
        BrushCategory::Ladder,
    ];

    /// Categories that are part of the collision world.
    pub const COLLIDABLE: [BrushCategory; 5] = [
        BrushCategory::Solid,
        BrushCategory::PlayerClip,
        BrushCategory::GrenadeClip,
        BrushCategory::Ladder,
        BrushCategory::Water,
    ];
}

/// A side of a brush.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BrushSide {
    /// Index of the plane of this side.
    pub plane_num: u16,
    /// Texture info index, `-1` if none.
    pub texinfo: i16,
    /// Displacement info index, `-1` if none.
    pub disp_info: i16,
    /// Bevel sides only matter for box traces, never for ray traces.
    pub bevel: bool,
}

/// A convex volume bounded by the planes of its sides.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Brush {
    /// Index of the first side of this brush.
    pub first_side: u32,
    /// Number of sides of this brush.
    pub num_sides: u32,
    /// Content flags.
    pub contents: BrushContents,
}

impl Brush {
    /// Does this brush have any of the given content flags?
    #[inline]
    pub fn has_flags(&self, flags: BrushContents) -> bool {
        self.contents.intersects(flags)
    }

    /// Does this brush belong to the given category?
    pub fn is_in_category(&self, category: BrushCategory) -> bool {
        match category {
            BrushCategory::Solid => {
                !self.has_flags(BrushContents::WATER | BrushContents::LADDER)
                    && self.has_flags(
                        BrushContents::SOLID | BrushContents::GRATE | BrushContents::WINDOW,
                    )
            }
            BrushCategory::PlayerClip => self.has_flags(BrushContents::PLAYERCLIP),
            BrushCategory::GrenadeClip => self.has_flags(BrushContents::GRENADECLIP),
            BrushCategory::Ladder => self.has_flags(BrushContents::LADDER),
            BrushCategory::Water => self.has_flags(BrushContents::WATER),
        }
    }

    /// Does this brush block a player's movement?
    pub fn is_solid_to_player(&self) -> bool {
        BrushCategory::SOLID_TO_PLAYER
            .iter()
            .any(|c| self.is_in_category(*c))
    }

    /// The sides of this brush, or an empty slice if they are out of bounds.
    pub fn sides<'a>(&self, brush_sides: &'a [BrushSide]) -> &'a [BrushSide] {
        let start = self.first_side as usize;
        let end = start + self.num_sides as usize;
        brush_sides.get(start..end).unwrap_or(&[])
    }

    /// The box bounded by the axis-aligned sides of this brush.
    ///
    /// Returns `None` if one of the six axial planes is missing.
    pub fn aabb(&self, brush_sides: &[BrushSide], planes: &[Plane]) -> Option<Aabb> {
        let mut mins = Vector::repeat(-Real::INFINITY);
        let mut maxs = Vector::repeat(Real::INFINITY);

        for side in self.sides(brush_sides) {
            let plane = planes.get(side.plane_num as usize)?;
            for axis in 0..3 {
                if plane.normal[axis] == -1.0 && -plane.dist > mins[axis] {
                    mins[axis] = -plane.dist;
                }
                if plane.normal[axis] == 1.0 && plane.dist < maxs[axis] {
                    maxs[axis] = plane.dist;
                }
            }
        }

        for axis in 0..3 {
            if mins[axis] == -Real::INFINITY || maxs[axis] == Real::INFINITY {
                log::debug!("Brush does not have all 6 axial sides.");
                return None;
            }
        }

        Some(Aabb::new(mins.into(), maxs.into()))
    }

    /// The corners of this brush.
    ///
    /// Computed as the intersections of every triple of side planes that lie behind (or on)
    /// every side plane.
    pub fn vertices(&self, brush_sides: &[BrushSide], planes: &[Plane]) -> Vec<Point<Real>> {
        const ON_PLANE_TOLERANCE: Real = 0.01;

        let brush_planes: Vec<Plane> = self
            .sides(brush_sides)
            .iter()
            .filter_map(|side| planes.get(side.plane_num as usize).copied())
            .collect();
        let mut result: Vec<Point<Real>> = Vec::new();

        for i in 0..brush_planes.len() {
            for j in i + 1..brush_planes.len() {
                for k in j + 1..brush_planes.len() {
                    let Some(pt) =
                        intersect_three_planes(&brush_planes[i], &brush_planes[j], &brush_planes[k])
                    else {
                        continue;
                    };

                    if brush_planes
                        .iter()
                        .all(|p| p.signed_dist(&pt) <= ON_PLANE_TOLERANCE)
                        && !result.iter().any(|v| (v - pt).norm() < ON_PLANE_TOLERANCE)
                    {
                        result.push(pt);
                    }
                }
            }
        }

        result
    }
}

fn intersect_three_planes(p1: &Plane, p2: &Plane, p3: &Plane) -> Option<Point<Real>> {
    let m = Matrix::from_rows(&[
        p1.normal.transpose(),
        p2.normal.transpose(),
        p3.normal.transpose(),
    ]);
    let inv = m.try_inverse()?;
    Some((inv * Vector::new(p1.dist, p2.dist, p3.dist)).into())
}

/// A brush model: the set of brushes making up the world (model 0) or a brush entity.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BrushModel {
    /// Origin of the model, unused for collisions.
    pub origin: Vector<Real>,
    /// Indices of the brushes of this model.
    pub brushes: Vec<u32>,
}

/// Borrowed view over the brush tables of a map.
#[derive(Copy, Clone, Debug)]
pub struct BrushTables<'a> {
    /// All planes.
    pub planes: &'a [Plane],
    /// All brushes.
    pub brushes: &'a [Brush],
    /// All brush sides.
    pub brush_sides: &'a [BrushSide],
    /// All brush models. Model 0 is the world.
    pub models: &'a [BrushModel],
}

impl<'a> BrushTables<'a> {
    /// The brushes of the given model, skipping out-of-bounds indices.
    pub fn model_brushes(&self, model: usize) -> impl Iterator<Item = (usize, &'a Brush)> + 'a {
        let brushes = self.brushes;
        self.models
            .get(model)
            .map(|m| m.brushes.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |i| brushes.get(*i as usize).map(|b| (*i as usize, b)))
    }
}

/// Sweeps `trace` against a world brush.
///
/// The brush is ignored unless it is solid to the player and has sides. Ray traces ignore bevel
/// sides. A hit commits the fraction, the plane normal and the texture info of the side.
pub fn swept_trace_brush(
    trace: &mut SweptTrace,
    brush: &Brush,
    brush_sides: &[BrushSide],
    planes: &[Plane],
) {
    if !brush.is_solid_to_player() || brush.num_sides == 0 {
        return;
    }

    let start = trace.info.startpos;
    let end = trace.info.startpos + trace.info.delta;
    let mut clip = SweptClip::new();

    for side in brush.sides(brush_sides) {
        let Some(plane) = planes.get(side.plane_num as usize) else {
            continue;
        };

        let dist = if trace.info.isray {
            if side.bevel {
                continue;
            }
            plane.dist
        } else {
            pushed_out_plane_dist(&plane.normal, plane.dist, &trace.info.extents)
        };

        let d1 = start.coords.dot(&plane.normal) - dist;
        let d2 = end.coords.dot(&plane.normal) - dist;

        if !clip.clip(d1, d2, || (plane.normal, side.texinfo)) {
            return;
        }
    }

    if let Some((fraction, (normal, surface))) = clip.finish(&mut trace.results) {
        trace.results.fraction = fraction;
        trace.results.plane_normal = normal;
        trace.results.surface = surface;
    }
}
