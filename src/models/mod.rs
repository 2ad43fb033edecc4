pub mod image;
pub mod message;

pub use image::*;
pub use message::*;
