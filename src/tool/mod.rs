pub mod image2image;
pub mod sink;

pub use image2image::{Image2ImageTool, MessageStream};
pub use sink::{ChannelSink, MessageSink};
