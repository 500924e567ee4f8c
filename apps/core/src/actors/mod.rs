//! # Actors
//!
//! One `ProfileActor` per user owns that user's profile; every mutation is a
//! message handled in order. The supervisor owns the registry of profile
//! actors and spawns them lazily.

pub mod messages;
pub mod profile;
pub mod supervisor;
pub mod traits;

pub use messages::ActorError;
pub use profile::{ProfileActorDeps, ProfileActorHandle};
pub use supervisor::SupervisorHandle;
pub use traits::ProfileActor;
