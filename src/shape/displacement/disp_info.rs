use crate::math::{Point, Real, Vector};

/// Collision flags of a displacement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct DispFlags(u32);

bitflags::bitflags! {
    impl DispFlags: u32 {
        /// Not solid to physics objects.
        const NO_PHYSICS_COLL = 1 << 1;
        /// Not solid to hulls (players and grenades).
        const NO_HULL_COLL = 1 << 2;
        /// Not solid to rays (bullets).
        const NO_RAY_COLL = 1 << 3;
        /// Unknown flag found in some maps.
        const UNKNOWN_1 = 1 << 30;
        /// Unknown flag found in some maps. Cleared on collision tree creation.
        const UNKNOWN_2 = 1 << 31;
    }
}

/// Indicates why the vertices of a displacement cannot be generated.
#[derive(thiserror::Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum DispError {
    /// Displacement collision trees only support powers 1 to 4.
    #[error("unsupported displacement power {0}")]
    UnsupportedPower(u32),
    /// The base face of a displacement must be a quad.
    #[error("the base face of a displacement must have 4 vertices, found {0}")]
    NotAQuad(usize),
    /// The displacement references vertex offsets past the end of the table.
    #[error("displacement vertex offsets out of bounds")]
    VertsOutOfBounds,
}

/// A displacement vertex offset: the vertex is moved by `dist` along `vec`.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct DispVert {
    /// Normalized offset direction.
    pub vec: Vector<Real>,
    /// Offset length.
    pub dist: Real,
}

/// The description of a displacement: a grid of `2^power + 1` squared vertices laid over a quad
/// face and individually offset.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct DispInfo {
    /// Start position, used to orient the grid on its base face.
    pub start_pos: Point<Real>,
    /// Index of the first vertex offset of this displacement.
    pub disp_vert_start: u32,
    /// Index of the first triangle tag of this displacement.
    pub disp_tri_start: u32,
    /// Grid resolution.
    pub power: u32,
    /// Collision flags.
    pub flags: DispFlags,
    /// Index of the base face.
    pub map_face: u16,
    /// The vertices of the base face, clockwise when seen from the front.
    pub map_face_vertices: Vec<Point<Real>>,
}

impl DispInfo {
    /// Number of vertices along one row of the grid.
    #[inline]
    pub fn num_row_vertices(&self) -> usize {
        (1 << self.power) + 1
    }

    /// Total number of vertices of the grid.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.num_row_vertices() * self.num_row_vertices()
    }

    /// Does this displacement have any of the given flags?
    #[inline]
    pub fn has_flags(&self, flags: DispFlags) -> bool {
        self.flags.intersects(flags)
    }

    /// Generates the displaced vertices of this displacement, row by row, in the order of the
    /// vertex offset table.
    ///
    /// The base face corner closest to `start_pos` is the grid origin. Each vertex is
    /// bilinearly interpolated over the base face, then offset by its [`DispVert`].
    pub fn vertices(&self, disp_verts: &[DispVert]) -> Result<Vec<Point<Real>>, DispError> {
        if !(1..=4).contains(&self.power) {
            return Err(DispError::UnsupportedPower(self.power));
        }

        let face = &self.map_face_vertices;
        if face.len() != 4 {
            return Err(DispError::NotAQuad(face.len()));
        }

        let first = self.disp_vert_start as usize;
        let offsets = disp_verts
            .get(first..first + self.num_vertices())
            .ok_or(DispError::VertsOutOfBounds)?;

        let mut start_idx = 0;
        let mut start_dist = na::distance_squared(&self.start_pos, &face[0]);
        for (i, v) in face.iter().enumerate().skip(1) {
            let dist = na::distance_squared(&self.start_pos, v);
            if dist < start_dist {
                start_idx = i;
                start_dist = dist;
            }
        }

        let top_left = face[(start_idx + 3) % 4].coords;
        let top_right = face[start_idx].coords;
        let bot_right = face[(start_idx + 1) % 4].coords;
        let bot_left = face[(start_idx + 2) % 4].coords;

        let row_len = self.num_row_vertices();
        let denom = (row_len - 1) as Real;

        let verts = offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| {
                let row_pos = (i % row_len) as Real / denom;
                let col_pos = (i / row_len) as Real / denom;
                let top = top_left * row_pos + top_right * (1.0 - row_pos);
                let bot = bot_left * row_pos + bot_right * (1.0 - row_pos);
                let flat = top * (1.0 - col_pos) + bot * col_pos;
                Point::from(flat + offset.vec * offset.dist)
            })
            .collect();

        Ok(verts)
    }
}
