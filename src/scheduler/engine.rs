//! Staged allocation engine.
//!
//! [`StageScheduler::run`] drives one complete allocation:
//!
//! 1. validate the config and the input snapshot (fatal on findings)
//! 2. preprocess: tier queues, driver pools, bottleneck notices
//! 3. for each tier in plan order: optionally consult the ranking
//!    oracle under a hard deadline, then walk the queue committing each
//!    order to its best feasible driver or recording why none exists
//! 4. compute metrics and assemble the report
//!
//! The engine never backtracks: a committed pairing is final, and a
//! later tier sees earlier commitments only through driver load and
//! timelines. Runs are deterministic for a given input snapshot, plan,
//! and oracle behavior; an absent, slow, or failing oracle yields
//! exactly the oracle-disabled result plus a degradation notice.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{AllocatorConfig, StrategyMode};
use crate::constraints::{classify_failure, feasible, region_score};
use crate::error::AllocationError;
use crate::models::{AllocationState, Assignment, Driver, Order, UnallocatedReason};
use crate::oracle::{OracleDriver, OracleOrder, OracleRequest, OracleResponse, PriorityOracle};
use crate::preprocess::preprocess;
use crate::scheduler::AllocationMetrics;
use crate::tiers::{Tier, TierPlan};
use crate::validation::validate_input;

/// Final result of one allocation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationReport {
    /// Per-driver rosters, busiest first.
    pub drivers: Vec<DriverAllocation>,
    /// Orders left unallocated, in processing order.
    pub unallocated: Vec<UnallocatedOrder>,
    /// Aggregated measurements.
    pub metrics: AllocationMetrics,
    /// Preprocessing findings and degraded-mode events.
    pub notices: Vec<String>,
}

/// One driver's roster for the day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverAllocation {
    pub driver_id: String,
    /// Committed orders, by window start then order id.
    pub assignments: Vec<Assignment>,
    /// `load / max_orders`; 0.0 for a zero-capacity driver.
    pub utilization: f64,
    /// Share of the roster inside the driver's preferred region; 1.0
    /// for an empty roster.
    pub in_region_share: f64,
}

/// One order the run gave up on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnallocatedOrder {
    pub order_id: String,
    pub reason: UnallocatedReason,
}

/// Greedy tier-by-tier allocator.
///
/// # Examples
///
/// ```
/// use u_dispatch::config::AllocatorConfig;
/// use u_dispatch::models::{Driver, Order};
/// use u_dispatch::scheduler::StageScheduler;
///
/// let orders = vec![Order::new("Q1", 0, 3_600_000).with_region("east")];
/// let drivers = vec![Driver::new("D1").with_preferred_region("east")];
///
/// let scheduler = StageScheduler::new(AllocatorConfig::default());
/// let report = tokio::runtime::Runtime::new()
///     .unwrap()
///     .block_on(scheduler.run(&orders, &drivers))
///     .unwrap();
/// assert_eq!(report.metrics.allocated, 1);
/// ```
pub struct StageScheduler {
    config: AllocatorConfig,
    plan: TierPlan,
    oracle: Option<Arc<dyn PriorityOracle>>,
}

impl StageScheduler {
    /// Creates a scheduler with the standard tier plan and no oracle.
    pub fn new(config: AllocatorConfig) -> Self {
        Self {
            config,
            plan: TierPlan::standard(),
            oracle: None,
        }
    }

    /// Replaces the tier plan.
    pub fn with_plan(mut self, plan: TierPlan) -> Self {
        self.plan = plan;
        self
    }

    /// Attaches a ranking oracle.
    pub fn with_oracle(mut self, oracle: Arc<dyn PriorityOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Runs one allocation over an input snapshot.
    ///
    /// Fails only on an unusable config or an invalid snapshot; oracle
    /// trouble and unallocatable orders are reported, not raised.
    pub async fn run(
        &self,
        orders: &[Order],
        drivers: &[Driver],
    ) -> Result<AllocationReport, AllocationError> {
        self.config
            .validate()
            .map_err(AllocationError::InvalidConfig)?;
        if self.plan.is_empty() {
            return Err(AllocationError::InvalidConfig("tier plan is empty".into()));
        }
        validate_input(orders, drivers).map_err(AllocationError::InvalidInput)?;

        info!(
            orders = orders.len(),
            drivers = drivers.len(),
            tiers = self.plan.len(),
            "allocation run started"
        );

        let pre = preprocess(orders, drivers, &self.plan);
        let mut state = AllocationState::new(drivers);
        for notice in &pre.notices {
            state.push_notice(notice.clone());
        }

        for (tier_idx, tier) in self.plan.tiers().iter().enumerate() {
            if pre.queues[tier_idx].is_empty() {
                debug!(tier = tier.name(), "queue empty, skipping");
                continue;
            }
            self.run_stage(tier, &pre.queues[tier_idx], orders, drivers, &mut state)
                .await;
        }

        let metrics = AllocationMetrics::calculate(orders, drivers, &state);
        info!(
            allocated = metrics.allocated,
            unallocated = state.unallocated().len(),
            "allocation run finished"
        );

        Ok(assemble_report(orders, drivers, &state, metrics))
    }

    /// Processes one tier's queue against the current state.
    async fn run_stage(
        &self,
        tier: &Tier,
        queue_indices: &[usize],
        orders: &[Order],
        drivers: &[Driver],
        state: &mut AllocationState,
    ) {
        let mut queue: Vec<&Order> = queue_indices.iter().map(|&i| &orders[i]).collect();
        tier.tie_break().sort_queue(&mut queue);

        // Candidates: spare capacity now and relevant to at least one
        // queued order. Capacity only shrinks mid-stage, so the pool
        // stays a superset of the feasible drivers throughout.
        let pool: Vec<&Driver> = drivers
            .iter()
            .filter(|d| state.load_of(&d.id) < d.max_orders)
            .filter(|d| queue.iter().any(|o| d.can_serve(o)))
            .collect();

        let advice = match &self.oracle {
            Some(oracle) if !pool.is_empty() => {
                let request =
                    build_request(tier.name(), self.config.strategy, &queue, &pool, state, &self.config);
                match tokio::time::timeout(self.config.oracle_timeout, oracle.propose(&request))
                    .await
                {
                    Ok(Ok(response)) => Some(response),
                    Ok(Err(err)) => {
                        warn!(tier = tier.name(), error = %err, "oracle failed, using deterministic order");
                        state.push_notice(format!(
                            "degraded: oracle failed for tier {}: {err}",
                            tier.name()
                        ));
                        None
                    }
                    Err(_) => {
                        warn!(tier = tier.name(), "oracle deadline missed, using deterministic order");
                        state.push_notice(format!(
                            "degraded: oracle timed out for tier {}",
                            tier.name()
                        ));
                        None
                    }
                }
            }
            _ => None,
        };

        let sequence = sequence_queue(&queue, advice.as_ref());

        let mut allocated_here = 0usize;
        for (order, suggestion) in sequence {
            if let Some((driver_id, rationale)) = suggestion {
                let suggested = drivers.iter().find(|d| d.id == driver_id);
                if let Some(driver) = suggested {
                    if feasible(order, driver, state, &self.config) {
                        state.commit(order, &driver.id, tier.name(), rationale);
                        allocated_here += 1;
                        continue;
                    }
                }
                debug!(
                    tier = tier.name(),
                    order = %order.id,
                    driver = %driver_id,
                    "advised pairing infeasible, falling back"
                );
            }

            match best_driver(order, &pool, state, &self.config) {
                Some(driver) => {
                    let rationale = describe_choice(order, driver, state);
                    state.commit(order, &driver.id, tier.name(), rationale);
                    allocated_here += 1;
                }
                None => {
                    let reason = classify_failure(order, drivers, state, &self.config);
                    debug!(tier = tier.name(), order = %order.id, reason = reason.as_str(), "order unallocated");
                    state.mark_unallocated(&order.id, reason);
                }
            }
        }

        info!(
            tier = tier.name(),
            queued = queue.len(),
            allocated = allocated_here,
            "stage finished"
        );
    }
}

impl Default for StageScheduler {
    fn default() -> Self {
        Self::new(AllocatorConfig::default())
    }
}

impl fmt::Debug for StageScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageScheduler")
            .field("config", &self.config)
            .field("plan", &self.plan)
            .field("oracle", &self.oracle.as_ref().map(|_| "dyn PriorityOracle"))
            .finish()
    }
}

/// Builds one stage's consultation payload from the live state.
fn build_request(
    tier: &str,
    strategy: StrategyMode,
    queue: &[&Order],
    pool: &[&Driver],
    state: &AllocationState,
    config: &AllocatorConfig,
) -> OracleRequest {
    let orders = queue
        .iter()
        .map(|o| OracleOrder {
            id: o.id.clone(),
            region: o.region.clone(),
            party_size: o.party_size,
            required: o.required,
            window: o.window.clone(),
            feasible_drivers: pool
                .iter()
                .filter(|d| feasible(o, d, state, config))
                .map(|d| d.id.clone())
                .collect(),
        })
        .collect();
    let drivers = pool
        .iter()
        .map(|d| OracleDriver {
            id: d.id.clone(),
            preferred_region: d.preferred_region.clone(),
            capabilities: d.capabilities,
            load: state.load_of(&d.id),
            max_orders: d.max_orders,
        })
        .collect();

    OracleRequest {
        tier: tier.to_string(),
        strategy,
        orders,
        drivers,
    }
}

/// Decides the stage's processing sequence.
///
/// Advised orders come first, in proposal order; the first mention of
/// an order wins and proposals naming orders outside the queue are
/// skipped. Everything unmentioned follows in the queue's tie-break
/// order with no suggestion attached.
fn sequence_queue<'a>(
    queue: &[&'a Order],
    advice: Option<&OracleResponse>,
) -> Vec<(&'a Order, Option<(String, String)>)> {
    let mut sequence = Vec::with_capacity(queue.len());
    let mut taken: HashSet<&str> = HashSet::new();

    if let Some(response) = advice {
        for proposal in &response.proposals {
            if taken.contains(proposal.order_id.as_str()) {
                continue;
            }
            if let Some(order) = queue.iter().find(|o| o.id == proposal.order_id) {
                taken.insert(order.id.as_str());
                let rationale = if proposal.rationale.is_empty() {
                    "ranking suggestion".to_string()
                } else {
                    proposal.rationale.clone()
                };
                sequence.push((*order, Some((proposal.driver_id.clone(), rationale))));
            }
        }
    }

    for order in queue {
        if !taken.contains(order.id.as_str()) {
            sequence.push((order, None));
        }
    }

    sequence
}

/// Picks the committed-ranking winner among feasible pool drivers:
/// region preference, then lowest utilization, then smallest id.
fn best_driver<'a>(
    order: &Order,
    pool: &[&'a Driver],
    state: &AllocationState,
    config: &AllocatorConfig,
) -> Option<&'a Driver> {
    pool.iter()
        .filter(|d| feasible(order, d, state, config))
        .min_by(|a, b| {
            region_score(order, a)
                .cmp(&region_score(order, b))
                .then_with(|| {
                    cmp_utilization(
                        state.load_of(&a.id),
                        a.max_orders,
                        state.load_of(&b.id),
                        b.max_orders,
                    )
                })
                .then_with(|| a.id.cmp(&b.id))
        })
        .copied()
}

/// Compares `load_a / max_a` against `load_b / max_b` exactly.
///
/// Cross-multiplied in `u64` so equal ratios (1/2 vs 2/4) compare equal
/// with no float rounding. Callers only compare drivers that passed the
/// capacity check, so both maxima are nonzero.
fn cmp_utilization(load_a: u32, max_a: u32, load_b: u32, max_b: u32) -> Ordering {
    (u64::from(load_a) * u64::from(max_b)).cmp(&(u64::from(load_b) * u64::from(max_a)))
}

fn describe_choice(order: &Order, driver: &Driver, state: &AllocationState) -> String {
    let region = if region_score(order, driver) == 0 {
        "in preferred region"
    } else {
        "out of preferred region"
    };
    format!(
        "best feasible driver: {region}, load {}/{}",
        state.load_of(&driver.id),
        driver.max_orders
    )
}

fn assemble_report(
    orders: &[Order],
    drivers: &[Driver],
    state: &AllocationState,
    metrics: AllocationMetrics,
) -> AllocationReport {
    let order_by_id: HashMap<&str, &Order> = orders.iter().map(|o| (o.id.as_str(), o)).collect();

    let mut rosters: Vec<DriverAllocation> = drivers
        .iter()
        .map(|driver| {
            let mut assignments: Vec<Assignment> = state
                .assignments_of(&driver.id)
                .into_iter()
                .cloned()
                .collect();
            assignments.sort_by(|a, b| {
                a.window
                    .start_ms
                    .cmp(&b.window.start_ms)
                    .then_with(|| a.order_id.cmp(&b.order_id))
            });

            let in_region = assignments
                .iter()
                .filter(|a| {
                    order_by_id
                        .get(a.order_id.as_str())
                        .is_some_and(|o| region_score(o, driver) == 0)
                })
                .count();
            let in_region_share = if assignments.is_empty() {
                1.0
            } else {
                in_region as f64 / assignments.len() as f64
            };

            DriverAllocation {
                driver_id: driver.id.clone(),
                utilization: metrics
                    .utilization_by_driver
                    .get(&driver.id)
                    .copied()
                    .unwrap_or(0.0),
                in_region_share,
                assignments,
            }
        })
        .collect();
    rosters.sort_by(|a, b| {
        b.utilization
            .total_cmp(&a.utilization)
            .then_with(|| a.driver_id.cmp(&b.driver_id))
    });

    let unallocated = state
        .unallocated()
        .iter()
        .map(|(order_id, reason)| UnallocatedOrder {
            order_id: order_id.clone(),
            reason: *reason,
        })
        .collect();

    AllocationReport {
        drivers: rosters,
        unallocated,
        metrics,
        notices: state.notices().to_vec(),
    }
}
