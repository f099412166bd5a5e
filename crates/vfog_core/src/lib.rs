//! vfog core utilities.
//!
//! Foundational types shared by every vfog crate:
//!
//! - [`errors`]: the [`FogError`] type and the crate-wide [`Result`] alias
//! - [`tracked`]: [`Tracked`], a resource wrapper carrying a unique identity
//! - [`version`]: [`ChangeTracker`], a monotonically increasing change counter

pub mod errors;
pub mod tracked;
pub mod version;

pub use errors::{FogError, Result};
pub use tracked::Tracked;
pub use version::ChangeTracker;
