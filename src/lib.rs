//! `relaycache`: a concurrent forwarding HTTP proxy for GET requests with
//! an in-memory, size-bounded response cache.
//!
//! The cache store (`cache`) is the only state shared across connection
//! workers; everything else in this crate is a stateless collaborator
//! confined to a single connection's task.

pub mod cache;
pub mod errors;
pub mod parser;
pub mod pipeline;
pub mod reader;
pub mod server;

pub use cache::{CacheEntry, CacheStore};
pub use parser::parse_absolute_uri;

/// Maximum bytes held across the whole cache.
pub const MAX_CACHE_SIZE: usize = 1_049_000;
/// Maximum bytes for a single cached object; larger responses are
/// forwarded but never admitted.
pub const MAX_OBJECT_SIZE: usize = 102_400;
/// Buffer unit used for line reads and chunked body streaming.
pub const MAXLINE: usize = 8192;

/// The fixed `User-Agent` the proxy presents upstream, in place of
/// whatever the client sent.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) Gecko/20120305 Firefox/10.0.3";

/// Builds the canonical cache key `host:port/path` for a parsed request.
///
/// `path` is expected to already carry its leading `/` (see
/// [`parser::parse_absolute_uri`]). The key is the string itself, not a
/// hash of it.
pub fn canonical_key(host: &str, port: &str, path: &str) -> String {
    format!("{host}:{port}{path}")
}
