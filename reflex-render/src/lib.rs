pub mod layout;
pub mod render;
pub mod scene;
pub mod text;

pub use layout::{Area, Layout};
pub use render::{FrameStats, SkiaRenderer};
pub use scene::{Label, Scene, Shape, build_scene};
pub use text::{TextCache, load_font};
