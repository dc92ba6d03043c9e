//! Typed cache errors.
//!
//! Only surfaced when strict validation is enabled; in lenient mode (the
//! default) key-absence conditions are absorbed as silent no-ops.

use crate::types::{OrderId, SecurityId, UserId};
use thiserror::Error;

/// Errors that can occur on cache operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// `add_order` with an id already present in the cache.
    #[error("duplicate order id: {0}")]
    DuplicateOrder(OrderId),

    /// Cancel or lookup against an order id not in the cache.
    #[error("unknown order id: {0}")]
    UnknownOrder(OrderId),

    /// Batch cancel against a user with no live orders.
    #[error("unknown user id: {0}")]
    UnknownUser(UserId),

    /// Query or batch cancel against a security with no live orders.
    #[error("unknown security id: {0}")]
    UnknownSecurity(SecurityId),

    /// Order rejected before admission (e.g. zero total quantity).
    #[error("invalid order: {0}")]
    InvalidOrder(String),
}
