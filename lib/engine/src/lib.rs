#![doc(test(attr(deny(warnings))))]

//! The resolver core: computes the exact scalar a user would see in a cell
//! for a named column on a named row, recursing through formulas and mirrors
//! across boards, with per-session caching, in-flight deduplication,
//! micro-batched remote queries and cycle termination.
//!
//! The only external capability the core consumes is a [QueryClient]. A
//! [ResolverSession] is created per top-level call, owns every cache and the
//! request coordinator, and is discarded when the call returns, so no state
//! is process-global.

mod cache;
mod cancel;
mod client;
mod columns;
mod coordinator;
mod eval;
mod resolver;
mod schema;
mod session;
mod strategy;

pub use cancel::{CancelHandle, CancelSignal};
pub use client::{ClientError, ColumnValueRecord, DeepMirrorRecord, LinkedItemRef, QueryClient};
pub use columns::{extract_scalar, record_scalar, RawColumnValue};
pub use eval::{evaluate, Environment};
pub use schema::BoardSchema;
pub use session::{new_session, ResolverSession, SessionOptions};
pub use strategy::{classify_dependencies, mirror_probe_useful, DependencyPlan};
