pub mod error;
pub mod logging;
pub mod map;
pub mod resource;
pub mod scene;
pub mod util;

pub use nalgebra_glm as glm;

pub use crate::error::MapError;
pub use crate::map::bsp::BSP;
pub use crate::map::geometry::{build_geometry, MapGeometry, TextureGroup};
pub use crate::map::wad::Wad;
