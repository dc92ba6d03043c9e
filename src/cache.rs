//! Cache facade: the public surface over the index set and matcher.
//!
//! Lock hierarchy, outermost first: the global orders lock, the per-order
//! working-quantity locks (matcher only), the match-cache lock. Eager mode
//! (the default) runs the matcher inside [`OrderCache::add_order`] under the
//! global write lock, so matching-size queries are O(1) cache reads. Lazy
//! mode defers matching to [`OrderCache::matching_size_for_security`], which
//! drives the matcher across the security's buy side under the global read
//! lock; per-order locks serialize fills between concurrent queries.

use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::index::IndexSet;
use crate::matching::match_order;
use crate::order::{OrderHandle, OrderRecord};
use crate::types::{MatchFill, Order, OrderId, SecurityId, UserId};
use log::debug;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;

/// Batch cancellations larger than this fan the eligibility scan out over
/// worker threads. The size is arbitrary.
const CANCEL_CHUNK_SIZE: usize = 64;

/// Thread-safe in-memory order cache with volume matching.
///
/// Accepts buy and sell orders for named securities, indexes them for O(1)
/// lookup and cancellation, and reports per security the total lot volume
/// matchable between buyers and sellers of different companies. All methods
/// take `&self`; the cache may be shared across threads behind an `Arc`.
pub struct OrderCache {
    config: CacheConfig,
    orders: RwLock<IndexSet>,
    matched: RwLock<HashMap<SecurityId, u64>>,
    fills: Mutex<Vec<MatchFill>>,
}

impl OrderCache {
    /// Creates a cache with the default configuration (eager matching,
    /// lenient validation).
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            config,
            orders: RwLock::new(IndexSet::default()),
            matched: RwLock::new(HashMap::new()),
            fills: Mutex::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Admits an order: inserts it into all four indexes and, in eager mode,
    /// runs the matcher against the opposite side. Returns the lots matched
    /// by this call (always 0 in lazy mode).
    ///
    /// A duplicate id is a no-op in lenient mode and
    /// [`CacheError::DuplicateOrder`] in strict mode; the existing order is
    /// never modified either way.
    pub fn add_order(&self, order: Order) -> Result<u64, CacheError> {
        let mut index = self.orders.write();
        if index.contains(&order.order_id) {
            if self.config.strict_validation {
                return Err(CacheError::DuplicateOrder(order.order_id));
            }
            debug!("ignoring duplicate order id {}", order.order_id);
            return Ok(0);
        }
        if order.qty == 0 && self.config.strict_validation {
            return Err(CacheError::InvalidOrder(format!(
                "order {} has zero quantity",
                order.order_id
            )));
        }
        let handle = OrderRecord::new(order);
        index.insert(handle.clone());
        if self.config.eager_match {
            Ok(self.run_matcher(&handle, &index))
        } else {
            Ok(0)
        }
    }

    /// Cancels one order by id, removing it from all four indexes. Returns
    /// whether an order was removed. Matches the order already contributed
    /// are history and stay in the match cache.
    pub fn cancel_order(&self, order_id: &OrderId) -> Result<bool, CacheError> {
        let mut index = self.orders.write();
        match index.remove(order_id) {
            Some(_) => Ok(true),
            None if self.config.strict_validation => {
                Err(CacheError::UnknownOrder(order_id.clone()))
            }
            None => {
                debug!("cancel for unknown order id {}", order_id);
                Ok(false)
            }
        }
    }

    /// Cancels every live order belonging to `user`. Returns the number of
    /// orders removed.
    pub fn cancel_orders_for_user(&self, user: &UserId) -> Result<usize, CacheError> {
        let mut index = self.orders.write();
        let ids: Vec<OrderId> = match index.ids_for_user(user) {
            Some(ids) => ids.iter().cloned().collect(),
            None if self.config.strict_validation => {
                return Err(CacheError::UnknownUser(user.clone()));
            }
            None => return Ok(0),
        };
        Ok(self.cancel_batch(&mut index, ids, 0))
    }

    /// Cancels every live order on `security` whose *original* total
    /// quantity is at least `min_qty`. Working quantity is not consulted.
    /// Returns the number of orders removed.
    pub fn cancel_orders_for_security_with_min_qty(
        &self,
        security: &SecurityId,
        min_qty: u64,
    ) -> Result<usize, CacheError> {
        let mut index = self.orders.write();
        let ids: Vec<OrderId> = match index.ids_for_security(security) {
            Some(ids) => ids.iter().cloned().collect(),
            None if self.config.strict_validation => {
                return Err(CacheError::UnknownSecurity(security.clone()));
            }
            None => return Ok(0),
        };
        Ok(self.cancel_batch(&mut index, ids, min_qty))
    }

    /// Total lots matchable for `security`. Eager mode reads the cache in
    /// O(1); lazy mode first drives the matcher across the security's buy
    /// side in insertion order, then reads the cache. Lenient mode returns
    /// the cached total (0 if nothing ever matched) even when the security
    /// has no live orders left.
    pub fn matching_size_for_security(&self, security: &SecurityId) -> Result<u64, CacheError> {
        let index = self.orders.read();
        if self.config.strict_validation && !index.has_security(security) {
            return Err(CacheError::UnknownSecurity(security.clone()));
        }
        if !self.config.eager_match {
            // Consumed volume matches zero on later passes, so repeated
            // queries settle on the same total as one eager stream.
            for buy in index.buys_for_security(security) {
                self.run_matcher(buy, &index);
            }
        }
        Ok(self.cached_matched(security))
    }

    /// Value snapshot of all live orders. Order is stable within one
    /// snapshot only.
    pub fn all_orders(&self) -> Vec<Order> {
        self.orders.read().orders_snapshot()
    }

    /// Copy of one live order's descriptor.
    pub fn order(&self, order_id: &OrderId) -> Option<Order> {
        self.orders.read().get(order_id).map(|h| h.order().clone())
    }

    pub fn exists(&self, order_id: &OrderId) -> bool {
        self.orders.read().contains(order_id)
    }

    /// Number of live orders.
    pub fn len(&self) -> usize {
        self.orders.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.read().is_empty()
    }

    /// Un-filled remainder of one live order.
    pub fn working_qty(&self, order_id: &OrderId) -> Option<u64> {
        self.orders.read().get(order_id).map(|h| h.working_qty())
    }

    /// Snapshot of the match log in pairing order. Empty unless
    /// [`CacheConfig::enable_match_log`] is set. Cancellations never remove
    /// entries.
    pub fn matches(&self) -> Vec<MatchFill> {
        self.fills.lock().clone()
    }

    /// Match-log entries for one security, in pairing order.
    pub fn matches_for_security(&self, security: &SecurityId) -> Vec<MatchFill> {
        self.fills
            .lock()
            .iter()
            .filter(|f| &f.security_id == security)
            .cloned()
            .collect()
    }

    fn cached_matched(&self, security: &SecurityId) -> u64 {
        self.matched.read().get(security).copied().unwrap_or(0)
    }

    /// Runs one matching pass and folds the result into the match cache and,
    /// when enabled, the match log.
    fn run_matcher(&self, subject: &OrderHandle, index: &IndexSet) -> u64 {
        let mut fills = Vec::new();
        let log = self.config.enable_match_log.then_some(&mut fills);
        let matched = match_order(subject, index, log);
        if matched > 0 {
            *self
                .matched
                .write()
                .entry(subject.security_id().clone())
                .or_insert(0) += matched;
            if !fills.is_empty() {
                self.fills.lock().extend(fills);
            }
        }
        matched
    }

    /// Removes a batch of ids, keeping only those whose original quantity
    /// meets `min_qty`. The eligibility scan reads immutable descriptor
    /// fields only, so for large batches it can fan out over worker threads;
    /// index mutation stays serial under the global write lock, which keeps
    /// the observable semantics identical to the serial path.
    fn cancel_batch(&self, index: &mut IndexSet, ids: Vec<OrderId>, min_qty: u64) -> usize {
        let eligible: Vec<OrderId> = if min_qty == 0 {
            ids
        } else if self.config.parallel_cancellation && ids.len() > CANCEL_CHUNK_SIZE {
            let shared: &IndexSet = index;
            std::thread::scope(|scope| {
                let workers: Vec<_> = ids
                    .chunks(CANCEL_CHUNK_SIZE)
                    .map(|chunk| {
                        scope.spawn(move || {
                            chunk
                                .iter()
                                .filter(|id| {
                                    shared.get(id).map_or(false, |h| h.qty() >= min_qty)
                                })
                                .cloned()
                                .collect::<Vec<_>>()
                        })
                    })
                    .collect();
                workers
                    .into_iter()
                    .flat_map(|w| w.join().expect("cancellation worker panicked"))
                    .collect()
            })
        } else {
            ids.into_iter()
                .filter(|id| index.get(id).map_or(false, |h| h.qty() >= min_qty))
                .collect()
        };
        let mut removed = 0;
        for id in &eligible {
            if index.remove(id).is_some() {
                removed += 1;
            }
        }
        removed
    }
}

impl Default for OrderCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Side;

    fn order(id: &str, sec: &str, side: Side, qty: u64, user: &str, company: &str) -> Order {
        Order::new(id, sec, side, qty, user, company)
    }

    #[test]
    fn add_and_match_eagerly_returns_matched_lots() {
        let cache = OrderCache::new();
        assert_eq!(
            cache
                .add_order(order("OrdId1", "SecId1", Side::Buy, 1000, "User1", "CompanyA"))
                .unwrap(),
            0
        );
        assert_eq!(
            cache
                .add_order(order("OrdId2", "SecId1", Side::Sell, 400, "User2", "CompanyB"))
                .unwrap(),
            400
        );
        assert_eq!(
            cache.matching_size_for_security(&"SecId1".into()).unwrap(),
            400
        );
        assert_eq!(cache.working_qty(&"OrdId1".into()), Some(600));
        assert_eq!(cache.working_qty(&"OrdId2".into()), Some(0));
    }

    #[test]
    fn duplicate_id_is_a_silent_noop_in_lenient_mode() {
        let cache = OrderCache::new();
        cache
            .add_order(order("OrdId1", "SecId1", Side::Buy, 100, "User1", "CompanyA"))
            .unwrap();
        let matched = cache
            .add_order(order("OrdId1", "SecId2", Side::Sell, 999, "User9", "CompanyZ"))
            .unwrap();
        assert_eq!(matched, 0);
        assert_eq!(cache.len(), 1);
        // The existing order is untouched.
        let kept = cache.order(&"OrdId1".into()).unwrap();
        assert_eq!(kept.security_id, "SecId1".into());
        assert_eq!(kept.qty, 100);
    }

    #[test]
    fn duplicate_id_is_an_error_in_strict_mode() {
        let cache = OrderCache::with_config(CacheConfig::new().with_strict_validation(true));
        cache
            .add_order(order("OrdId1", "SecId1", Side::Buy, 100, "User1", "CompanyA"))
            .unwrap();
        let err = cache
            .add_order(order("OrdId1", "SecId1", Side::Buy, 100, "User1", "CompanyA"))
            .unwrap_err();
        assert_eq!(err, CacheError::DuplicateOrder("OrdId1".into()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn zero_qty_order_is_rejected_in_strict_mode_only() {
        let lenient = OrderCache::new();
        lenient
            .add_order(order("OrdId1", "SecId1", Side::Buy, 0, "User1", "CompanyA"))
            .unwrap();
        assert_eq!(lenient.len(), 1);
        assert_eq!(lenient.working_qty(&"OrdId1".into()), Some(0));

        let strict = OrderCache::with_config(CacheConfig::new().with_strict_validation(true));
        assert!(matches!(
            strict.add_order(order("OrdId1", "SecId1", Side::Buy, 0, "User1", "CompanyA")),
            Err(CacheError::InvalidOrder(_))
        ));
    }

    #[test]
    fn cancel_twice_equals_cancel_once_in_lenient_mode() {
        let cache = OrderCache::new();
        cache
            .add_order(order("OrdId1", "SecId1", Side::Buy, 100, "User1", "CompanyA"))
            .unwrap();
        assert_eq!(cache.cancel_order(&"OrdId1".into()).unwrap(), true);
        assert_eq!(cache.cancel_order(&"OrdId1".into()).unwrap(), false);
        assert!(cache.is_empty());
    }

    #[test]
    fn cancel_unknown_id_is_an_error_in_strict_mode() {
        let cache = OrderCache::with_config(CacheConfig::new().with_strict_validation(true));
        assert_eq!(
            cache.cancel_order(&"missing".into()).unwrap_err(),
            CacheError::UnknownOrder("missing".into())
        );
    }

    #[test]
    fn cancel_orders_for_user_removes_only_that_user() {
        let cache = OrderCache::new();
        cache
            .add_order(order("OrdId1", "SecId1", Side::Buy, 200, "User1", "Company1"))
            .unwrap();
        cache
            .add_order(order("OrdId2", "SecId2", Side::Sell, 300, "User1", "Company1"))
            .unwrap();
        cache
            .add_order(order("OrdId3", "SecId3", Side::Buy, 400, "User2", "Company2"))
            .unwrap();
        assert_eq!(cache.cancel_orders_for_user(&"User1".into()).unwrap(), 2);
        let remaining = cache.all_orders();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].order_id, "OrdId3".into());
        // The user entry is gone: a second batch is a lenient no-op.
        assert_eq!(cache.cancel_orders_for_user(&"User1".into()).unwrap(), 0);
    }

    #[test]
    fn cancel_orders_for_unknown_user_is_strict_error() {
        let cache = OrderCache::with_config(CacheConfig::new().with_strict_validation(true));
        assert_eq!(
            cache.cancel_orders_for_user(&"ghost".into()).unwrap_err(),
            CacheError::UnknownUser("ghost".into())
        );
    }

    #[test]
    fn min_qty_threshold_compares_against_original_qty() {
        let cache = OrderCache::new();
        cache
            .add_order(order("OrdId1", "SecId1", Side::Buy, 200, "User1", "Company1"))
            .unwrap();
        cache
            .add_order(order("OrdId2", "SecId1", Side::Sell, 500, "User2", "Company2"))
            .unwrap();
        cache
            .add_order(order("OrdId3", "SecId1", Side::Buy, 300, "User3", "Company2"))
            .unwrap();
        // OrdId1 and OrdId2 matched 200 lots; OrdId2's working qty is 300,
        // but the threshold looks at its original 500.
        assert_eq!(
            cache
                .cancel_orders_for_security_with_min_qty(&"SecId1".into(), 300)
                .unwrap(),
            2
        );
        let remaining = cache.all_orders();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].order_id, "OrdId1".into());
    }

    #[test]
    fn match_cache_is_not_decremented_by_cancellation() {
        let cache = OrderCache::new();
        cache
            .add_order(order("OrdId1", "SecId1", Side::Buy, 500, "User1", "CompanyA"))
            .unwrap();
        cache
            .add_order(order("OrdId2", "SecId1", Side::Sell, 500, "User2", "CompanyB"))
            .unwrap();
        assert_eq!(
            cache.matching_size_for_security(&"SecId1".into()).unwrap(),
            500
        );
        cache.cancel_order(&"OrdId1".into()).unwrap();
        cache.cancel_order(&"OrdId2".into()).unwrap();
        assert!(cache.is_empty());
        // Matches are historical events.
        assert_eq!(
            cache.matching_size_for_security(&"SecId1".into()).unwrap(),
            500
        );
    }

    #[test]
    fn matching_size_for_unknown_security_is_zero_lenient_error_strict() {
        let lenient = OrderCache::new();
        assert_eq!(
            lenient.matching_size_for_security(&"SecId9".into()).unwrap(),
            0
        );

        let strict = OrderCache::with_config(CacheConfig::new().with_strict_validation(true));
        assert_eq!(
            strict
                .matching_size_for_security(&"SecId9".into())
                .unwrap_err(),
            CacheError::UnknownSecurity("SecId9".into())
        );
    }

    #[test]
    fn lazy_mode_defers_matching_to_the_query() {
        let cache = OrderCache::with_config(CacheConfig::new().with_eager_match(false));
        assert_eq!(
            cache
                .add_order(order("OrdId1", "SecId1", Side::Buy, 1000, "User1", "CompanyA"))
                .unwrap(),
            0
        );
        assert_eq!(
            cache
                .add_order(order("OrdId2", "SecId1", Side::Sell, 400, "User2", "CompanyB"))
                .unwrap(),
            0
        );
        // Nothing filled until the query drives the matcher.
        assert_eq!(cache.working_qty(&"OrdId2".into()), Some(400));
        assert_eq!(
            cache.matching_size_for_security(&"SecId1".into()).unwrap(),
            400
        );
        assert_eq!(cache.working_qty(&"OrdId2".into()), Some(0));
        // Repeated queries settle on the same total.
        assert_eq!(
            cache.matching_size_for_security(&"SecId1".into()).unwrap(),
            400
        );
    }

    #[test]
    fn match_log_records_pairings_in_canonical_orientation() {
        let cache = OrderCache::with_config(CacheConfig::new().with_match_log(true));
        cache
            .add_order(order("OrdId1", "SecId1", Side::Sell, 300, "User1", "CompanyA"))
            .unwrap();
        cache
            .add_order(order("OrdId2", "SecId1", Side::Buy, 500, "User2", "CompanyB"))
            .unwrap();
        cache
            .add_order(order("OrdId3", "SecId2", Side::Buy, 100, "User3", "CompanyA"))
            .unwrap();
        cache
            .add_order(order("OrdId4", "SecId2", Side::Sell, 100, "User4", "CompanyB"))
            .unwrap();
        let all = cache.matches();
        assert_eq!(all.len(), 2);
        // Buy id first even though the sell was admitted first.
        assert_eq!(all[0].buy_order_id, "OrdId2".into());
        assert_eq!(all[0].sell_order_id, "OrdId1".into());
        assert_eq!(all[0].qty, 300);

        let sec2 = cache.matches_for_security(&"SecId2".into());
        assert_eq!(sec2.len(), 1);
        assert_eq!(sec2[0].buy_order_id, "OrdId3".into());

        // Cancellation never removes log entries.
        cache.cancel_order(&"OrdId1".into()).unwrap();
        assert_eq!(cache.matches().len(), 2);
        assert_eq!(cache.matches_for_security(&"SecId1".into()).len(), 1);
    }

    #[test]
    fn match_log_is_empty_when_disabled() {
        let cache = OrderCache::new();
        cache
            .add_order(order("OrdId1", "SecId1", Side::Sell, 300, "User1", "CompanyA"))
            .unwrap();
        cache
            .add_order(order("OrdId2", "SecId1", Side::Buy, 300, "User2", "CompanyB"))
            .unwrap();
        assert_eq!(
            cache.matching_size_for_security(&"SecId1".into()).unwrap(),
            300
        );
        assert!(cache.matches().is_empty());
    }

    #[test]
    fn large_batch_cancellation_matches_serial_semantics() {
        for parallel in [true, false] {
            let cache = OrderCache::with_config(
                CacheConfig::new().with_parallel_cancellation(parallel),
            );
            for i in 0..200 {
                let qty = if i % 2 == 0 { 100 } else { 900 };
                cache
                    .add_order(order(
                        &format!("Ord{}", i),
                        "SecId1",
                        Side::Buy,
                        qty,
                        &format!("User{}", i),
                        "CompanyA",
                    ))
                    .unwrap();
            }
            assert_eq!(
                cache
                    .cancel_orders_for_security_with_min_qty(&"SecId1".into(), 500)
                    .unwrap(),
                100
            );
            assert_eq!(cache.len(), 100);
            assert!(cache.all_orders().iter().all(|o| o.qty == 100));
        }
    }
}
