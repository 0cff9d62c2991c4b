pub mod build;
pub mod compare;
pub mod render;
pub mod resolve;
pub mod snapshot;
