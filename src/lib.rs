//! # fieldstore
//!
//! A field-oriented data store: records are archived and retrieved by a
//! structured key (attribute → value), not by file name.
//!
//! - A schema of bracketed rules decides which attributes partition data
//!   into physical database directories
//! - An append-only journal per database records index segment lifecycle
//!   and replays it into the live segment list
//! - A gatherer merges the byte ranges found for a request into one handle
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Request Key                            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │   DatabaseLocator  ──▶  Schema (first-level match)           │
//! │   roots × `name:index` dirs × regex × INIT key check         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ database directories
//!                       ▼
//!               ┌───────────────┐
//!               │    Journal    │  replay → index segments
//!               │   (toc file)  │  (newest first)
//!               └───────┬───────┘
//!                       │ (external traversal resolves fields)
//!                       ▼
//!               ┌───────────────┐
//!               │HandleGatherer │  → MultiHandle
//!               └───────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod key;
pub mod types;
pub mod schema;
pub mod journal;
pub mod locator;
pub mod gather;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::{AccessMode, Config, RootProvider, RootSet};
pub use error::{FieldError, Result};
pub use gather::{DataHandle, HandleGatherer, MultiHandle, PartHandle};
pub use journal::{IndexSegment, Journal};
pub use key::Key;
pub use locator::DatabaseLocator;
pub use schema::Schema;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of fieldstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
