//! Scene side of vfog.
//!
//! - [`FogVolumeNode`]: a scene node carrying one local fog volume
//! - [`VolumeRegistry`]: ordered membership of the currently active volumes
//! - [`FogScene`]: per-scene context owning the nodes, the registry and the
//!   global fog state

pub mod node;
pub mod registry;
pub mod scene;

pub use node::{FogVolumeKey, FogVolumeNode};
pub use registry::{VolumeRegistry, VolumeSnapshot};
pub use scene::FogScene;
