pub mod grid_world;
pub mod objects;

pub use grid_world::*;
pub use objects::*;
