pub mod client;
pub mod interface;

pub use client::VisionClient;
pub use interface::TextDetector;
