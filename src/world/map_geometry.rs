use crate::math::{Real, Vector};
use crate::shape::{Brush, BrushModel, BrushSide, BrushTables, DispInfo, DispVert, FuncBrush, Plane};

/// The `solid` value of static props colliding through their VPhysics model.
pub const SOLID_VPHYSICS: u8 = 6;

/// A `prop_static` placement.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct StaticProp {
    /// Path of the model, looked up case-insensitively in a
    /// [`CollisionModelLibrary`](crate::shape::CollisionModelLibrary).
    pub model: String,
    /// Position of the prop.
    pub origin: Vector<Real>,
    /// Orientation `(pitch, yaw, roll)` in degrees.
    pub angles: Vector<Real>,
    /// Uniform scale factor.
    pub uniform_scale: Real,
    /// Solidity type. Only [`SOLID_VPHYSICS`] props collide.
    pub solid: u8,
}

impl Default for StaticProp {
    fn default() -> Self {
        Self {
            model: String::new(),
            origin: Vector::zeros(),
            angles: Vector::zeros(),
            uniform_scale: 1.0,
            solid: SOLID_VPHYSICS,
        }
    }
}

impl StaticProp {
    /// Does this prop collide through its collision model?
    #[inline]
    pub fn is_solid_with_vphysics(&self) -> bool {
        self.solid == SOLID_VPHYSICS
    }
}

/// A dynamic prop entity, collidable in its spawn placement. Dynamic props are never scaled.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct DynamicProp {
    /// Path of the model.
    pub model: String,
    /// Position of the prop.
    pub origin: Vector<Real>,
    /// Orientation `(pitch, yaw, roll)` in degrees.
    pub angles: Vector<Real>,
}

/// The collision-related tables of a parsed map.
///
/// Objects reference each other by index into these tables. Invalid indices are skipped by
/// every consumer.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct MapGeometry {
    /// Brush planes.
    pub planes: Vec<Plane>,
    /// Brushes of every brush model.
    pub brushes: Vec<Brush>,
    /// Brush sides.
    pub brush_sides: Vec<BrushSide>,
    /// Brush models. Model 0 is the world.
    pub models: Vec<BrushModel>,
    /// `func_brush` entities.
    pub func_brushes: Vec<FuncBrush>,
    /// Displacement descriptions.
    pub disp_infos: Vec<DispInfo>,
    /// Displacement vertex offsets.
    pub disp_verts: Vec<DispVert>,
    /// Static props.
    pub static_props: Vec<StaticProp>,
    /// Dynamic props.
    pub dynamic_props: Vec<DynamicProp>,
}

impl MapGeometry {
    /// A borrowed view over the brush tables.
    pub fn brush_tables(&self) -> BrushTables<'_> {
        BrushTables {
            planes: &self.planes,
            brushes: &self.brushes,
            brush_sides: &self.brush_sides,
            models: &self.models,
        }
    }
}
