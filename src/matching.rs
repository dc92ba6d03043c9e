//! Unsorted-greedy volume matching.
//!
//! [`match_order`] runs one admitted order against the opposite-side working
//! list for its security: first eligible counterparty wins, the matched
//! volume is the minimum of the two working quantities, and partial fills
//! stay in the list for later subjects. Counterparties from the subject's own
//! company are excluded.

use crate::index::IndexSet;
use crate::order::OrderHandle;
use crate::types::{MatchFill, Side};

/// Runs the unsorted-greedy pass for `subject` against the live index.
/// Returns the total lots matched by this pass; appends one [`MatchFill`] per
/// pairing to `fills` when a log is supplied.
///
/// Locking: the subject's working-quantity lock is held for the whole pass
/// and each candidate's lock is taken one at a time, so candidate fills are
/// serialized against matchers running for other subjects. Candidate
/// eligibility (filled, same company) is pre-checked without the candidate
/// lock; the zero-volume re-check under the lock catches lost races.
///
/// Repeated invocation after the subject is filled returns 0.
pub(crate) fn match_order(
    subject: &OrderHandle,
    index: &IndexSet,
    mut fills: Option<&mut Vec<MatchFill>>,
) -> u64 {
    let mut subject_working = subject.lock_working();
    if *subject_working == 0 {
        return 0;
    }

    let candidates = index.counterparties(subject.security_id(), subject.side());
    let mut matched = 0u64;
    for candidate in candidates {
        // A company never trades with itself.
        if candidate.is_filled() || candidate.company_id() == subject.company_id() {
            continue;
        }
        let mut candidate_working = candidate.lock_working();
        let qty = (*subject_working).min(*candidate_working);
        if qty == 0 {
            continue;
        }
        *subject_working -= qty;
        *candidate_working -= qty;
        matched += qty;
        if let Some(log) = fills.as_mut() {
            let (buy, sell) = match subject.side() {
                Side::Buy => (subject.order_id(), candidate.order_id()),
                Side::Sell => (candidate.order_id(), subject.order_id()),
            };
            log.push(MatchFill {
                security_id: subject.security_id().clone(),
                buy_order_id: buy.clone(),
                sell_order_id: sell.clone(),
                qty,
            });
        }
        if *subject_working == 0 {
            break;
        }
    }
    matched
}
