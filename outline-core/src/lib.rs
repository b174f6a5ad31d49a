pub mod bake;
pub mod config;
pub mod error;
pub mod highlight;
pub mod mesh;
pub mod render;
pub mod scene;
pub mod timer;

pub use error::{OutlineError, Result};
pub use highlight::HighlightManager;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
