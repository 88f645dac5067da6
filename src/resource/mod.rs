pub mod image;
pub mod resource;
