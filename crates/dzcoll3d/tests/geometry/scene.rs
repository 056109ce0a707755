use dzcoll3d::math::{Point, Real, Vector};
use dzcoll3d::query::SweptTrace;
use dzcoll3d::shape::{
    Brush, BrushContents, BrushModel, BrushSide, CollisionModel, CollisionModelLibrary, DispFlags,
    DispInfo, DispVert, FuncBrush, FuncBrushSolidity, Plane, SectionTriMesh,
};
use dzcoll3d::world::{DynamicProp, MapGeometry, StaticProp};

/// Appends an axis-aligned box brush to the tables, returns its index.
pub fn push_box_brush(
    geometry: &mut MapGeometry,
    mins: Point<Real>,
    maxs: Point<Real>,
    contents: BrushContents,
) -> u32 {
    let first_side = geometry.brush_sides.len() as u32;
    for axis in 0..3 {
        let mut n = Vector::zeros();
        n[axis] = 1.0;
        for (normal, dist) in [(n, maxs[axis]), (-n, -mins[axis])] {
            geometry.brush_sides.push(BrushSide {
                plane_num: geometry.planes.len() as u16,
                texinfo: geometry.brush_sides.len() as i16,
                disp_info: -1,
                bevel: false,
            });
            geometry.planes.push(Plane::new(normal, dist));
        }
    }
    geometry.brushes.push(Brush {
        first_side,
        num_sides: 6,
        contents,
    });
    geometry.brushes.len() as u32 - 1
}

/// Makes `brushes` the world model.
pub fn set_world_brushes(geometry: &mut MapGeometry, brushes: Vec<u32>) {
    let world = BrushModel {
        origin: Vector::zeros(),
        brushes,
    };
    if geometry.models.is_empty() {
        geometry.models.push(world);
    } else {
        geometry.models[0] = world;
    }
}

/// Appends a square displacement of side `size` whose first vertex is `origin`, with heights
/// given by `height(x, y)`.
pub fn push_displacement(
    geometry: &mut MapGeometry,
    power: u32,
    origin: Point<Real>,
    size: Real,
    flags: DispFlags,
    height: impl Fn(Real, Real) -> Real,
) {
    let corner = |dx: Real, dy: Real| Point::new(origin.x + dx, origin.y + dy, origin.z);
    let info = DispInfo {
        start_pos: origin,
        disp_vert_start: geometry.disp_verts.len() as u32,
        disp_tri_start: 0,
        power,
        flags,
        map_face: 0,
        map_face_vertices: vec![
            corner(0.0, 0.0),
            corner(0.0, size),
            corner(size, size),
            corner(size, 0.0),
        ],
    };

    let width = info.num_row_vertices();
    let step = size / (width - 1) as Real;
    for row in 0..width {
        for col in 0..width {
            let x = origin.x + col as Real * step;
            let y = origin.y + row as Real * step;
            geometry.disp_verts.push(DispVert {
                vec: Vector::z(),
                dist: height(x, y),
            });
        }
    }
    geometry.disp_infos.push(info);
}

/// A single-section box collision model.
pub fn box_model(mins: Point<Real>, maxs: Point<Real>) -> CollisionModel {
    let v = |i: u16| {
        Point::new(
            if i & 1 != 0 { maxs.x } else { mins.x },
            if i & 2 != 0 { maxs.y } else { mins.y },
            if i & 4 != 0 { maxs.z } else { mins.z },
        )
    };
    // Counter-clockwise quads seen from outside.
    let quads: [[u16; 4]; 6] = [
        [0, 2, 3, 1],
        [4, 5, 7, 6],
        [0, 1, 5, 4],
        [2, 6, 7, 3],
        [0, 4, 6, 2],
        [1, 3, 7, 5],
    ];
    let tris = quads
        .iter()
        .flat_map(|[a, b, c, d]| [[*a, *c, *b], [*a, *d, *c]])
        .collect();
    let section = SectionTriMesh::new((0..8).map(v).collect(), tris).unwrap();
    CollisionModel::new(vec![section])
}

/// A single-section collision model of a square pyramid with its apex on top.
pub fn pyramid_model(half_width: Real, height: Real) -> CollisionModel {
    let vertices = vec![
        Point::new(-half_width, -half_width, 0.0),
        Point::new(half_width, -half_width, 0.0),
        Point::new(half_width, half_width, 0.0),
        Point::new(-half_width, half_width, 0.0),
        Point::new(0.0, 0.0, height),
    ];
    // Clockwise seen from outside.
    let tris = vec![
        [0, 1, 2],
        [0, 2, 3],
        [0, 4, 1],
        [1, 4, 2],
        [2, 4, 3],
        [3, 4, 0],
    ];
    let section = SectionTriMesh::new(vertices, tris).unwrap();
    CollisionModel::new(vec![section])
}

pub const BOX_MODEL: &str = "models/props/crate.mdl";
pub const PYRAMID_MODEL: &str = "models/props/pyramid.mdl";

pub fn library() -> CollisionModelLibrary {
    let mut library = CollisionModelLibrary::new();
    library.insert(
        BOX_MODEL,
        box_model(Point::new(-16.0, -16.0, 0.0), Point::new(16.0, 16.0, 40.0)),
    );
    library.insert(PYRAMID_MODEL, pyramid_model(24.0, 48.0));
    library
}

pub fn random_point(rng: &mut oorandom::Rand32, z_range: Real) -> Point<Real> {
    Point::new(
        rng.rand_float() * 1200.0 - 100.0,
        rng.rand_float() * 1200.0 - 100.0,
        rng.rand_float() * z_range - 100.0,
    )
}

pub fn random_angles(rng: &mut oorandom::Rand32) -> Vector<Real> {
    Vector::new(
        rng.rand_float() * 90.0 - 45.0,
        rng.rand_float() * 360.0,
        rng.rand_float() * 90.0 - 45.0,
    )
}

/// A grid of box brushes of various contents, rotated func_brushes, two sine terrain tiles,
/// and scattered static and dynamic props.
pub fn random_scene(rng: &mut oorandom::Rand32) -> MapGeometry {
    let mut geometry = MapGeometry::default();

    let contents = [
        BrushContents::SOLID,
        BrushContents::SOLID | BrushContents::DETAIL,
        BrushContents::PLAYERCLIP,
        BrushContents::LADDER,
        BrushContents::WATER,
        BrushContents::GRENADECLIP,
    ];
    let mut world_brushes = Vec::new();
    for i in 0..6 {
        for j in 0..6 {
            let mins = Point::new(i as Real * 180.0, j as Real * 180.0, rng.rand_float() * 50.0);
            let size = Vector::new(
                20.0 + rng.rand_float() * 100.0,
                20.0 + rng.rand_float() * 100.0,
                10.0 + rng.rand_float() * 150.0,
            );
            let contents = contents[rng.rand_range(0..contents.len() as u32) as usize];
            world_brushes.push(push_box_brush(&mut geometry, mins, mins + size, contents));
        }
    }
    set_world_brushes(&mut geometry, world_brushes);

    let func_brush_brush = push_box_brush(
        &mut geometry,
        Point::new(-40.0, -20.0, 0.0),
        Point::new(40.0, 20.0, 60.0),
        BrushContents::SOLID,
    );
    geometry.models.push(BrushModel {
        origin: Vector::zeros(),
        brushes: vec![func_brush_brush],
    });
    geometry.func_brushes.push(FuncBrush {
        model: "*1".to_string(),
        origin: Vector::new(500.0, 520.0, 100.0),
        angles: Vector::new(10.0, 35.0, -20.0),
        solidity: FuncBrushSolidity::Always,
        start_disabled: false,
    });
    for _ in 0..5 {
        geometry.func_brushes.push(FuncBrush {
            model: "*1".to_string(),
            origin: random_point(rng, 200.0).coords,
            angles: random_angles(rng),
            solidity: FuncBrushSolidity::Always,
            start_disabled: false,
        });
    }

    let terrain = |x: Real, y: Real| (x * 0.03).sin() * 30.0 + (y * 0.02).cos() * 20.0;
    for origin in [Point::new(0.0, 0.0, -60.0), Point::new(512.0, 0.0, -60.0)] {
        push_displacement(&mut geometry, 3, origin, 512.0, DispFlags::empty(), terrain);
    }

    for i in 0..24 {
        geometry.static_props.push(StaticProp {
            model: if i % 2 == 0 { BOX_MODEL } else { PYRAMID_MODEL }.to_string(),
            origin: random_point(rng, 200.0).coords,
            angles: random_angles(rng),
            uniform_scale: 0.5 + rng.rand_float() * 1.5,
            ..Default::default()
        });
    }
    for _ in 0..8 {
        geometry.dynamic_props.push(DynamicProp {
            model: PYRAMID_MODEL.to_string(),
            origin: random_point(rng, 200.0).coords,
            angles: random_angles(rng),
        });
    }

    geometry
}

/// A ray, a player hull or a cube of random size between two random points.
pub fn random_trace(rng: &mut oorandom::Rand32) -> SweptTrace {
    if rng.rand_range(0..3) == 0 {
        let start = random_point(rng, 400.0);
        SweptTrace::new_ray(start, random_point(rng, 400.0))
    } else {
        random_hull_trace(rng)
    }
}

/// A player hull or a cube of random size between two random points.
pub fn random_hull_trace(rng: &mut oorandom::Rand32) -> SweptTrace {
    let start = random_point(rng, 400.0);
    let end = random_point(rng, 400.0);

    if rng.rand_range(0..2) == 0 {
        SweptTrace::new_hull(
            start,
            end,
            Vector::new(-16.0, -16.0, 0.0),
            Vector::new(16.0, 16.0, 72.0),
        )
    } else {
        let half = 1.0 + rng.rand_float() * 20.0;
        SweptTrace::new_hull(start, end, Vector::repeat(-half), Vector::repeat(half))
    }
}
