//! Front half of an ahead-of-time CIL to C++ translator: the IR builder.
//!
//! The crate consumes a pre-loaded assembly set through the
//! [`il::MetadataProvider`] trait, computes the reachable surface, lifts the
//! reachable method bodies into a typed instruction tree and hands the
//! resulting [`ir::IrModule`] to a downstream source emitter. Loading PE
//! images, rendering C++ text and driving the whole thing from a command
//! line are jobs for other crates.

pub mod attrs;
pub mod builder;
pub mod errors;
pub mod generics;
pub mod il;
pub mod intercept;
pub mod ir;
pub mod lift;
pub mod names;
pub mod reach;

pub use builder::{BuildOptions, IrBuilder};
pub use errors::{BuildError, LiftError};
