#[macro_use]
extern crate approx;

mod aabb_overlap;
mod bevel_lut;
mod brush_trace;
mod bvh_equivalence;
mod displacement_trace;
mod narrow_phases;
mod scene;
mod world_build;
