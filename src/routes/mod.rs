//! Route module aggregator: re-exports to preserve `routes::*` API.

pub mod docs;
pub mod health;
pub mod prom;
pub mod profile;
pub mod schemas;

// Re-exports (public surface preserved)
pub use docs::{docs_ui, swagger_ui};
pub use health::{health, ready};
pub use prom::prom_metrics;
pub use profile::{
    cancel_session, compare, create_session, delta, finalize_session, pooled_merge,
    schemas_merge, trend, upload_chunk,
};
pub use schemas::openapi;
