//! Synthetic order-stream generator.
//!
//! Deterministic, configurable order streams for replay tests, property
//! tests, and benches. Same seed ⇒ same sequence of orders.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::cache::OrderCache;
use crate::error::CacheError;
use crate::types::{Order, Side};

/// Configuration for the synthetic order generator.
/// All ranges are inclusive. Same config + seed produces the same stream.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// RNG seed. Same seed ⇒ same order stream.
    pub seed: u64,
    /// Number of orders to generate when collecting with [`Generator::all_orders`].
    pub num_orders: usize,
    /// Distinct securities (SecId1..=SecIdN).
    pub num_securities: usize,
    /// Distinct users (User1..=UserN).
    pub num_users: usize,
    /// Distinct companies (Company1..=CompanyN).
    pub num_companies: usize,
    /// Probability of Sell (0.0..=1.0). Buy otherwise.
    pub sell_ratio: f64,
    /// Quantity range (inclusive), whole lots.
    pub qty_min: u64,
    pub qty_max: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            num_orders: 1000,
            num_securities: 4,
            num_users: 8,
            num_companies: 3,
            sell_ratio: 0.5,
            qty_min: 1,
            qty_max: 1000,
        }
    }
}

/// Deterministic order stream. Create with [`Generator::new`]; pull orders
/// with [`Generator::next_order`] or collect the whole stream.
pub struct Generator {
    rng: StdRng,
    config: GeneratorConfig,
    next_order_id: u64,
}

impl Generator {
    /// Builds a generator with the given config. Same config (including
    /// seed) ⇒ same stream.
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            rng,
            config,
            next_order_id: 1,
        }
    }

    /// Generates the next order. Advances internal state (order id, RNG).
    pub fn next_order(&mut self) -> Order {
        let order_id = format!("Ord{}", self.next_order_id);
        self.next_order_id += 1;
        let security_id = format!(
            "SecId{}",
            self.rng.gen_range(1..=self.config.num_securities.max(1))
        );
        let side = if self.rng.gen::<f64>() < self.config.sell_ratio {
            Side::Sell
        } else {
            Side::Buy
        };
        let qty = self
            .rng
            .gen_range(self.config.qty_min..=self.config.qty_max.max(self.config.qty_min));
        let user_id = format!("User{}", self.rng.gen_range(1..=self.config.num_users.max(1)));
        let company_id = format!(
            "Company{}",
            self.rng.gen_range(1..=self.config.num_companies.max(1))
        );
        Order::new(order_id, security_id, side, qty, user_id, company_id)
    }

    /// Returns a vector of exactly `n` orders. Advances the generator state.
    pub fn take_orders(&mut self, n: usize) -> Vec<Order> {
        (0..n).map(|_| self.next_order()).collect()
    }

    /// Returns the full stream of orders as defined by `config.num_orders`.
    pub fn all_orders(&mut self) -> Vec<Order> {
        let n = self.config.num_orders;
        self.take_orders(n)
    }
}

/// Replays a sequence of orders into the cache. Returns the total lots
/// matched across the replay (or the first error in strict mode).
pub fn replay_into_cache(
    cache: &OrderCache,
    orders: impl IntoIterator<Item = Order>,
) -> Result<u64, CacheError> {
    let mut total_matched = 0u64;
    for order in orders {
        total_matched += cache.add_order(order)?;
    }
    Ok(total_matched)
}
