use super::disp_coll_tree::{DispCollTree, DISPCOLL_DIST_EPSILON};
use crate::math::{Point, Real, Vector};
use crate::utils;
use hashbrown::HashMap;
use ordered_float::OrderedFloat;

/// Marks an edge-cross-axis plane that does not exist (degenerate or axial edge).
pub const NORMAL_UNDEF: u16 = 0xffff;
/// Set on an edge plane reference whose stored plane must be negated.
pub const NEGATED_PLANE_BIT: u16 = 0x8000;

type PlaneKey = [OrderedFloat<Real>; 3];

/// Scratch table de-duplicating the edge planes of one displacement while its cache is built.
///
/// A plane and its negation share the same entry. The table is cleared at the end of every
/// cache build so it can be reused for the next displacement without reallocating.
#[derive(Clone, Debug, Default)]
pub struct PlaneIndexTable {
    entries: HashMap<PlaneKey, (Vector<Real>, u16)>,
}

impl PlaneIndexTable {
    /// An empty table.
    pub fn new() -> Self {
        Self {
            entries: HashMap::with_capacity(512),
        }
    }

    /// The number of distinct planes, up to sign, in this table.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Is this table empty?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry, keeping the allocated memory.
    pub fn clear(&mut self) {
        self.entries.clear()
    }

    // Key shared by `v` and `-v`: the lexicographically greatest of both.
    fn key(v: &Vector<Real>) -> PlaneKey {
        let pos = [OrderedFloat(v.x), OrderedFloat(v.y), OrderedFloat(v.z)];
        let neg = [OrderedFloat(-v.x), OrderedFloat(-v.y), OrderedFloat(-v.z)];
        pos.max(neg)
    }

    /// Adds `plane` to `planes` unless it, or its negation, is already known.
    ///
    /// Returns the index of the plane in `planes`, with [`NEGATED_PLANE_BIT`] set if the known
    /// plane is the negation of `plane`.
    pub fn add_plane(&mut self, plane: Vector<Real>, planes: &mut Vec<Vector<Real>>) -> u16 {
        let next_index = planes.len() as u16;
        let (known, index) = *self
            .entries
            .entry(Self::key(&plane))
            .or_insert((plane, next_index));

        if index == next_index && known == plane {
            planes.push(plane);
            index
        } else if known == plane {
            index
        } else {
            index | NEGATED_PLANE_BIT
        }
    }
}

/// The edge planes of every triangle of a displacement, needed by swept box queries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DispCollCache {
    /// For every triangle, the reference of the plane crossing each of its 3 edges with each
    /// axis, indexed by `[axis][edge]`.
    pub tri_planes: Vec<[[u16; 3]; 3]>,
    /// Unique edge planes. The component of the crossed axis stores the plane distance.
    pub edge_planes: Vec<Vector<Real>>,
}

impl DispCollCache {
    /// The edge plane referenced by `plane_ref`, as `(normal, dist)` where the normal has a
    /// zero `axis` component.
    #[inline]
    pub fn edge_plane(&self, plane_ref: u16, axis: usize) -> Option<(Vector<Real>, Real)> {
        if plane_ref == NORMAL_UNDEF {
            return None;
        }

        let mut normal = self.edge_planes[(plane_ref & !NEGATED_PLANE_BIT) as usize];
        if plane_ref & NEGATED_PLANE_BIT != 0 {
            normal = -normal;
        }

        let dist = normal[axis];
        normal[axis] = 0.0;
        Some((normal, dist))
    }
}

impl DispCollTree {
    /// Is the edge plane cache built?
    #[inline]
    pub fn is_cached(&self) -> bool {
        self.cache.get().is_some()
    }

    /// Builds the edge plane cache if it is not built yet.
    pub fn ensure_cache(&self) {
        let _ = self.cache();
    }

    /// Builds the edge plane cache if it is not built yet, using `table` as scratch memory.
    pub fn ensure_cache_with(&self, table: &mut PlaneIndexTable) {
        let _ = self.cache.get_or_init(|| self.build_cache(table));
    }

    /// Drops the edge plane cache. It is rebuilt on the next swept box query.
    pub fn uncache(&mut self) {
        let _ = self.cache.take();
    }

    pub(crate) fn cache(&self) -> &DispCollCache {
        self.cache
            .get_or_init(|| self.build_cache(&mut PlaneIndexTable::new()))
    }

    fn build_cache(&self, table: &mut PlaneIndexTable) -> DispCollCache {
        let mut cache = DispCollCache {
            tri_planes: Vec::with_capacity(self.tris.len()),
            edge_planes: Vec::new(),
        };

        for tri in &self.tris {
            let v = self.triangle_vertices(tri);
            let mut refs = [[NORMAL_UNDEF; 3]; 3];

            // Edge i goes from v[i] to v[i + 1], the remaining vertex lies off the edge.
            for edge in 0..3 {
                let on_edge = &v[edge];
                let off_edge = &v[(edge + 2) % 3];
                let dir = v[(edge + 1) % 3] - on_edge;

                for (axis, axis_refs) in refs.iter_mut().enumerate() {
                    axis_refs[edge] = edge_cross_axis_plane(&dir, on_edge, off_edge, axis)
                        .map(|plane| table.add_plane(plane, &mut cache.edge_planes))
                        .unwrap_or(NORMAL_UNDEF);
                }
            }

            cache.tri_planes.push(refs);
        }

        table.clear();
        cache
    }
}

/// The plane containing an edge and parallel to `axis`, facing away from the triangle.
///
/// The returned vector has the unit normal on the two other axes and the plane distance on
/// `axis`. Returns `None` if the normal would have a zero component on one of the other axes.
fn edge_cross_axis_plane(
    edge: &Vector<Real>,
    on_edge: &Point<Real>,
    off_edge: &Point<Real>,
    axis: usize,
) -> Option<Vector<Real>> {
    let a1 = (axis + 1) % 3;
    let a2 = (axis + 2) % 3;

    let mut normal = Vector::zeros();
    normal[a1] = edge[a2];
    normal[a2] = -edge[a1];
    let _ = utils::normalize_in_place(&mut normal);

    if normal[a1] == 0.0 || normal[a2] == 0.0 {
        return None;
    }

    let dist = normal[a1] * on_edge[a1] + normal[a2] * on_edge[a2];
    let off_dist = normal[a1] * off_edge[a1] + normal[a2] * off_edge[a2];

    if !((off_dist - dist).abs() < DISPCOLL_DIST_EPSILON) && off_dist > dist {
        normal[a1] = -normal[a1];
        normal[a2] = -normal[a2];
        normal[axis] = -dist;
    } else {
        normal[axis] = dist;
    }

    Some(normal)
}
