//! Multi-index order store.
//!
//! Four mappings kept in lockstep under the cache's global orders lock:
//! by-id, by-user, by-security, and per-security buy/sell working lists in
//! insertion order. Index entries hold handles or ids; the by-id map and the
//! side lists share ownership of the record through its handle.

use crate::order::OrderHandle;
use crate::types::{Order, OrderId, SecurityId, Side, UserId};
use std::collections::{HashMap, HashSet};

/// The four order indexes. Not synchronized itself; the cache wraps it in
/// the global orders lock.
#[derive(Debug, Default)]
pub(crate) struct IndexSet {
    by_id: HashMap<OrderId, OrderHandle>,
    by_user: HashMap<UserId, HashSet<OrderId>>,
    by_security: HashMap<SecurityId, HashSet<OrderId>>,
    buys: HashMap<SecurityId, Vec<OrderHandle>>,
    sells: HashMap<SecurityId, Vec<OrderHandle>>,
}

impl IndexSet {
    pub fn contains(&self, id: &OrderId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn get(&self, id: &OrderId) -> Option<&OrderHandle> {
        self.by_id.get(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Inserts the order into all four indexes. The caller must have checked
    /// for a duplicate id first.
    pub fn insert(&mut self, handle: OrderHandle) {
        let order = handle.order();
        self.by_user
            .entry(order.user_id.clone())
            .or_default()
            .insert(order.order_id.clone());
        self.by_security
            .entry(order.security_id.clone())
            .or_default()
            .insert(order.order_id.clone());
        let side_lists = match order.side {
            Side::Buy => &mut self.buys,
            Side::Sell => &mut self.sells,
        };
        side_lists
            .entry(order.security_id.clone())
            .or_default()
            .push(handle.clone());
        self.by_id.insert(order.order_id.clone(), handle);
    }

    /// Removes the order from all four indexes, pruning 1:N entries that
    /// become empty. Returns the removed handle, or `None` for an unknown id.
    pub fn remove(&mut self, id: &OrderId) -> Option<OrderHandle> {
        let handle = self.by_id.remove(id)?;
        let order = handle.order();
        if let Some(ids) = self.by_user.get_mut(&order.user_id) {
            ids.remove(id);
            if ids.is_empty() {
                self.by_user.remove(&order.user_id);
            }
        }
        if let Some(ids) = self.by_security.get_mut(&order.security_id) {
            ids.remove(id);
            if ids.is_empty() {
                self.by_security.remove(&order.security_id);
            }
        }
        let side_lists = match order.side {
            Side::Buy => &mut self.buys,
            Side::Sell => &mut self.sells,
        };
        if let Some(list) = side_lists.get_mut(&order.security_id) {
            list.retain(|h| h.order_id() != id);
            if list.is_empty() {
                side_lists.remove(&order.security_id);
            }
        }
        Some(handle)
    }

    /// Ids of all live orders for a user, or `None` for an unknown user.
    pub fn ids_for_user(&self, user: &UserId) -> Option<&HashSet<OrderId>> {
        self.by_user.get(user)
    }

    /// Ids of all live orders for a security, or `None` for an unknown one.
    pub fn ids_for_security(&self, security: &SecurityId) -> Option<&HashSet<OrderId>> {
        self.by_security.get(security)
    }

    /// True if the security has at least one live order.
    pub fn has_security(&self, security: &SecurityId) -> bool {
        self.by_security.contains_key(security)
    }

    /// The working list a subject on `side` matches against: the opposite
    /// side of the same security, in insertion order.
    pub fn counterparties(&self, security: &SecurityId, side: Side) -> &[OrderHandle] {
        let side_lists = match side {
            Side::Buy => &self.sells,
            Side::Sell => &self.buys,
        };
        side_lists.get(security).map_or(&[], |list| list.as_slice())
    }

    /// Buy-side working list for a security, in insertion order. Drives the
    /// matcher in lazy mode.
    pub fn buys_for_security(&self, security: &SecurityId) -> &[OrderHandle] {
        self.buys.get(security).map_or(&[], |list| list.as_slice())
    }

    /// Value copies of all live order descriptors. Order is stable within one
    /// snapshot; callers must not assume anything further.
    pub fn orders_snapshot(&self) -> Vec<Order> {
        self.by_id.values().map(|h| h.order().clone()).collect()
    }
}
