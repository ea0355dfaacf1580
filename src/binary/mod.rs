// Mon Oct 19 2026 - Alex

pub mod identity;
pub mod image;
pub mod sections;

pub use identity::{BinaryIdentity, IdentitySource};
pub use image::{BinaryImage, ContainerFormat};
pub use sections::DebugSections;
