pub mod generator;
pub mod types;

pub use generator::FrameGenerator;
pub use types::Frame;
