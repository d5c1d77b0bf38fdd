pub mod instance;

pub use instance::{TransformBuffer, WorldTransform};
