#![doc(test(attr(deny(warnings))))]

//! Resolves formula and mirror columns to the concrete scalar a user would
//! see in a cell, recursing through mirrors of formulas on other boards,
//! with per-session caching, in-flight deduplication, micro-batched remote
//! queries and cycle termination.
//!
//! The crate consumes a single external capability, the
//! [engine::QueryClient], and exposes the [engine::ResolverSession] built
//! around it:
//!
//! ```no_run
//! use formula_resolver::engine::{new_session, SessionOptions};
//! use formula_resolver::model::{BoardId, ColumnId, ItemId};
//! # async fn example(client: std::sync::Arc<dyn formula_resolver::engine::QueryClient>) {
//! let session = new_session(client, SessionOptions::default());
//! let value = session
//!     .resolve(BoardId::new(123), ColumnId::new("formula1"), ItemId::new(100))
//!     .await
//!     .expect("platform reachable");
//! println!("{value}");
//! session.close().await;
//! # }
//! # let _ = example;
//! ```
//!
//! Sessions are cheap and single-purpose: create one per top-level call,
//! resolve, and drop it. Nothing is shared between sessions.

pub mod engine {
    pub use formula_resolver_engine::*;
}

pub mod functions {
    pub use formula_resolver_functions::*;
}

pub mod language {
    pub use formula_resolver_language::*;
}

pub mod model {
    pub use formula_resolver_model::*;
}

pub use engine::{new_session, QueryClient, ResolverSession, SessionOptions};
pub use model::{BoardId, ColumnId, ItemId, ResolveError, Scalar};
