//! # Order Cache
//!
//! In-memory order cache for a simplified exchange-style call auction:
//! accepts buy and sell orders for named securities, indexes them for O(1)
//! lookup and cancellation, and reports per security the total lot volume
//! matchable between buyers and sellers, where orders from the same company
//! never match. Orders carry no price; only lot volumes matter.
//!
//! Matching is unsorted-greedy: a newly admitted order walks the opposite
//! side of its security in insertion order, pairing the minimum of the two
//! working quantities against each eligible counterparty. Results are folded
//! into a per-security match cache so aggregate queries are O(1) in the
//! default (eager) mode; a lazy mode defers the whole pass to query time.
//!
//! ## Entry point
//!
//! Use [`OrderCache`] as the single entry point: create with
//! [`OrderCache::new`] (or [`OrderCache::with_config`]), then
//! [`OrderCache::add_order`], [`OrderCache::cancel_order`], and
//! [`OrderCache::matching_size_for_security`]. The cache is safe to share
//! across threads behind an `Arc`.
//!
//! ## Example
//!
//! ```rust
//! use order_cache::{Order, OrderCache, Side};
//!
//! let cache = OrderCache::new();
//! cache
//!     .add_order(Order::new("OrdId1", "SecId1", Side::Buy, 1000, "User1", "CompanyA"))
//!     .unwrap();
//! cache
//!     .add_order(Order::new("OrdId2", "SecId1", Side::Sell, 400, "User2", "CompanyB"))
//!     .unwrap();
//! assert_eq!(cache.matching_size_for_security(&"SecId1".into()).unwrap(), 400);
//! ```

pub mod api;
pub mod audit;
pub mod cache;
pub mod config;
pub mod error;
mod index;
mod matching;
pub mod order;
pub mod order_gen;
pub mod types;

pub use cache::OrderCache;
pub use config::CacheConfig;
pub use error::CacheError;
pub use order::{OrderHandle, OrderRecord};
pub use types::{CompanyId, MatchFill, Order, OrderId, SecurityId, Side, UserId};
