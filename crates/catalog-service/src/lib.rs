//! HTTP surface of the catalog API: the route table, handlers and the API
//! reference. Startup lives in `main.rs`; everything needed to drive the
//! router in tests is exported here.

pub mod docs;
pub mod routes;

pub use routes::{available_routes, build_router, KnownRoute, KNOWN_ROUTES};
