//! Concrete benchmark providers: an in-memory/JSON table, an HTTP client for
//! a remote benchmark service, and a TTL cache that wraps either.

pub mod cache;
pub mod http;
pub mod table;

pub use cache::CachedBenchmarkProvider;
pub use http::HttpBenchmarkProvider;
pub use statement_core::NoBenchmarks;
pub use table::{BenchmarkEntry, StaticBenchmarkProvider, TableError};
