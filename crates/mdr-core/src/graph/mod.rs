//! Graph store over the persisted registry rows
//!
//! Copyright (c) 2025 MDR Team
//! Licensed under the Apache-2.0 license

pub mod cache;
pub mod integrity;
pub mod snapshot;
pub mod store;

pub use cache::{CacheStats, SchemaCache};
pub use integrity::{IntegrityRule, IntegrityViolation};
pub use snapshot::{active, Snapshot, SnapshotRow};
pub use store::{AccessFilters, AccessScope, GraphStore, GraphView};
