//! Trading tools
//!
//! Caching helpers for expensive, owner-scoped trading operations plus the
//! logging plumbing around them:
//!
//! - **Durable cache**: results memoized to files under a directory resolved
//!   from a `{placeholder}` template and the owner's attributes
//! - **Count-based cache**: in-memory results recomputed every N calls
//! - **Runtime logging**: console/file logger and stream redirection
//!
//! See [`cache`] and [`log`].

pub mod cli;
pub mod config;

pub use trading_cache as cache;
pub use trading_log as log;
