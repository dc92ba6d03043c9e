//! Order record: immutable descriptor plus lock-guarded working quantity.
//!
//! The cache owns each record behind an [`OrderHandle`]; indexes store handle
//! clones, never iterators into a container. The per-order lock serializes
//! working-quantity mutation so a matcher can fill a counterparty while other
//! matchers run against different subjects.

use crate::types::{CompanyId, Order, OrderId, SecurityId, Side, UserId};
use parking_lot::{RwLock, RwLockWriteGuard};
use std::sync::Arc;

/// Shared handle to a live order record. Cloning is cheap; the cache drops
/// its clones when the order is cancelled.
pub type OrderHandle = Arc<OrderRecord>;

/// A live order: the immutable descriptor and the mutable working quantity.
#[derive(Debug)]
pub struct OrderRecord {
    order: Order,
    working: RwLock<u64>,
}

impl OrderRecord {
    /// Wraps a descriptor into a live record with the full quantity working.
    pub fn new(order: Order) -> OrderHandle {
        let working = RwLock::new(order.qty);
        Arc::new(Self { order, working })
    }

    /// The immutable descriptor this record was created from.
    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn order_id(&self) -> &OrderId {
        &self.order.order_id
    }

    pub fn security_id(&self) -> &SecurityId {
        &self.order.security_id
    }

    pub fn side(&self) -> Side {
        self.order.side
    }

    pub fn user_id(&self) -> &UserId {
        &self.order.user_id
    }

    pub fn company_id(&self) -> &CompanyId {
        &self.order.company_id
    }

    /// Total lot count, fixed at construction.
    pub fn qty(&self) -> u64 {
        self.order.qty
    }

    /// Current working (un-filled) quantity. Concurrent readers may observe
    /// any valid intermediate value.
    pub fn working_qty(&self) -> u64 {
        *self.working.read()
    }

    /// Filled quantity: total minus working.
    pub fn filled_qty(&self) -> u64 {
        self.order.qty - self.working_qty()
    }

    /// True when no working lots remain.
    pub fn is_filled(&self) -> bool {
        self.working_qty() == 0
    }

    /// Subtracts `qty` working lots, saturating at zero. Never fails.
    pub fn fill(&self, qty: u64) {
        let mut working = self.working.write();
        *working = working.saturating_sub(qty);
    }

    /// Adds `qty` working lots back, capped at the total. Never fails.
    pub fn unfill(&self, qty: u64) {
        let mut working = self.working.write();
        *working = working.saturating_add(qty).min(self.order.qty);
    }

    /// Restores the full working quantity. Test support.
    pub fn reset_fills(&self) {
        *self.working.write() = self.order.qty;
    }

    /// Exclusive access to the working quantity for a matching pass. The
    /// matcher holds the subject's guard for the whole pass and takes each
    /// candidate's guard one at a time.
    pub(crate) fn lock_working(&self) -> RwLockWriteGuard<'_, u64> {
        self.working.write()
    }
}
