pub mod api;
pub mod compare;
pub mod config;
pub mod error;
pub mod geometry;
pub mod keycodes;
pub mod render;
pub mod schema;
pub mod selector;
pub mod session;
pub mod snapshot;

pub use api::{build_layout, LayoutEngine, LayoutResult};
pub use error::{TfResult, TouchForgeError};
pub use geometry::{SafeArea, Viewport};
pub use keycodes::resolve_key_descriptor;
pub use schema::{normalize, SchemaInput};
