pub use self::clip_swept_box_half_spaces::{pushed_out_plane_dist, SweptClip};

mod clip_swept_box_half_spaces;
