pub mod entity;
pub mod revision;
pub mod window;

pub use entity::{ContainerId, Entity, EntityId, Namespace};
pub use revision::{Author, RedactionFlags, Revision, RevisionKind};
pub use window::QueryWindow;
