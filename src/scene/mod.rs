//! Scene content: generated entities, static props and the context tying
//! them to the camera and input

pub mod context;
pub mod entity;
pub mod placement;
pub mod props;
pub mod registry;

pub use context::{PressOutcome, SceneContext};
pub use entity::{Entity, EntityId, ShapeKind};
pub use props::StaticProps;
pub use registry::EntityRegistry;
