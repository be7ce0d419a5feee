#![forbid(unsafe_code)]

//! Core: geometry, logging, and revision tracking for dockgraph.
//!
//! # Role in dockgraph
//! `dockgraph-core` holds the small value types shared by the layout engine
//! and its hosts. It has no knowledge of the docking tree itself.
//!
//! # Primary responsibilities
//! - **Geometry**: [`Orientation`], [`Size`] hints, and floating-window
//!   [`Bounds`] in logical units.
//! - **Logging**: a façade over `tracing` that compiles to nothing when the
//!   `tracing` feature is off.
//! - **Revision watching**: [`RevisionWatcher`] folds any number of revision
//!   bumps into one rebuild signal per poll.
//!
//! # How it fits in the system
//! `dockgraph-layout` owns the element tree and bumps revision counters on
//! every effective mutation. Renderers poll those counters through a
//! [`RevisionWatcher`] once per frame and rebuild their view when it reports a
//! change.

pub mod geometry;
pub mod logging;
pub mod revision;

pub use geometry::{Bounds, Orientation, Size};
pub use revision::RevisionWatcher;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};
