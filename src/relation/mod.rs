//! Relation module for model relationships.
//!
//! This module provides everything needed to turn declared relations into joins:
//! - **Identity**: ordered (possibly compound) keys
//! - **Def**: relation definitions (`Relation`, `RelationType`) and their resolution into `ResolvedJoin`s
//! - **Through**: relations routed through an intermediate link table
//! - **Eager**: the per-query registry of joined relation paths
//! - **Helpers**: join condition building

// Identity types
pub mod identity;
#[doc(inline)]
pub use identity::OrderedKey;

// Relation definitions
pub mod def;
#[doc(inline)]
pub use def::{JoinKind, KeyPair, Relation, RelationType, ResolvedJoin};

// Through-table relations
pub mod through;
#[doc(inline)]
pub use through::Through;

// Path registry
pub mod eager;
#[doc(inline)]
pub use eager::{Eager, EagerLoad};

// Helper functions
pub mod helpers;
#[doc(inline)]
pub use helpers::join_condition;
