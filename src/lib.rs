//! Mock REST API Server
//!
//! A configurable mock HTTP API server used as a test double in front of a
//! gateway or management layer. It serves a generic CRUD surface over the
//! object types of a static dataset, applies JSON Patch partial updates,
//! and injects configurable latency and failures to exercise resiliency
//! behavior in the layer under test.
//!
//! # Features
//!
//! - **Generic CRUD**: list/get/create/replace/delete over arbitrary object types
//! - **JSON Patch**: RFC 6902 partial updates, applied atomically
//! - **OpenAPI Serving**: the loaded document is served on a fixed route
//! - **Latency Simulation**: a fixed delay on every request
//! - **Failure Injection**: probabilistic 500s, drawn after the delay
//!
//! # Example Dataset
//!
//! ```json
//! {
//!   "weather": {
//!     "0": { "city": "Lyon", "weather": "Moderate rain" }
//!   }
//! }
//! ```
//!
//! Object types are fixed at load time; ids are either dataset keys or
//! generated at creation time. The stored body never contains the `id`
//! field - it is attached when a document is serialized for a response.

pub mod chaos;
pub mod config;
pub mod error;
pub mod patch;
pub mod router;
pub mod server;
pub mod spec;
pub mod store;

pub use chaos::ChaosConfig;
pub use config::ServerConfig;
pub use error::ApiError;
pub use patch::{PatchError, PatchOp};
pub use router::{build_router, AppState};
pub use server::MockServer;
pub use spec::SpecDocument;
pub use store::{Document, ObjectStore};
