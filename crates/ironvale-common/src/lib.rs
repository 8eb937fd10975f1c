//! # Ironvale Common
//!
//! Common types and shared abstractions for Ironvale.
//!
//! This crate provides foundational types used across all Ironvale crates:
//! - Map geometry (bounds, clamping, positions)
//! - ID types (EntityId)
//! - Version information for snapshot schemas
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;
pub mod version;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::version::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_clamp_keeps_inside() {
        let bounds = MapBounds::new(4000.0, 3000.0);
        let clamped = bounds.clamp(Vec2::new(-10.0, 3500.0));
        assert_eq!(clamped, Vec2::new(0.0, 3000.0));
    }

    #[test]
    fn test_entity_id_generation() {
        let id1 = EntityId::new();
        let id2 = EntityId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_version_compatibility() {
        let v1 = SchemaVersion::new(1, 0, 0);
        let v2 = SchemaVersion::new(1, 1, 0);
        let v3 = SchemaVersion::new(2, 0, 0);

        assert!(v2.is_compatible_with(&v1));
        assert!(!v1.is_compatible_with(&v3));
    }
}
