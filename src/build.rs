mod builder;
mod document;
mod highlight;
mod markdown;
mod paths;
pub mod pipeline;
mod render;

pub use builder::{BuildResult, Builder};
