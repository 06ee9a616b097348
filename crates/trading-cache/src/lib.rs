//! Per-call-site result caching for expensive owner-scoped operations.
//!
//! This crate provides:
//! - `DurableCache`: memoizes results to files under a directory resolved from
//!   a `{placeholder}` path template and the owner's attributes
//! - `JsonCodec` / `BincodeCodec`: inspectable and opaque on-disk formats
//! - `CountCache`: in-memory memoization that recomputes every N calls
//!
//! ```no_run
//! use trading_cache::{attribute_map, DurableCache};
//!
//! let cache = DurableCache::json("cache/{exchange_name}/").unwrap();
//! let owner = attribute_map([("exchange_name", "binance")]);
//! let markets: Vec<String> = cache
//!     .memoize("markets", &owner, |_| Ok(vec!["BTC/USDT".to_string()]))
//!     .unwrap();
//! // Stored at cache/binance/markets.json as {"value":["BTC/USDT"]}
//! # let _ = markets;
//! ```

pub mod attributes;
pub mod codec;
pub mod count;
pub mod error;
pub mod metrics;
pub mod paths;
pub mod store;
pub mod template;

pub use attributes::{attribute_map, AttributeMap, Attributes, SerializedAttributes};
pub use codec::{BincodeCodec, CacheEntry, Codec, CodecError, JsonCodec};
pub use count::{CountCache, CountState, SyncCountCache};
pub use error::{CacheError, Result};
pub use metrics::{CacheMetrics, MetricsSnapshot};
pub use store::{CachedOperation, DurableCache};
pub use template::{resolve, PathTemplate};
