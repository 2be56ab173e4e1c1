//! The decision pipeline.
//!
//! Stages run cheapest first and the first definitive answer wins:
//!
//! 1. necessary conditions (dominance, volume, dual bound) can reject
//! 2. sufficient conditions (min-edge stack, cube grid, shelf) can accept
//! 3. a common divisor of all edges reruns the pipeline once, scaled down
//! 4. the exact search settles whatever is left, within the time budget

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, enabled, trace, Level};

use crate::bounds;
use crate::cuboid::Cuboid;
use crate::error::{Error, Result};
use crate::heuristics;
use crate::placement::format_layout;
use crate::reduce;
use crate::solver::{self, SearchLimits, SearchOutcome};

/// Search nodes between deadline checks unless configured otherwise.
pub const DEFAULT_POLL_INTERVAL: u32 = 256;

/// Dual feasible functions tried per axis unless configured otherwise.
pub const DEFAULT_DUAL_BOUND_DEPTH: u32 = 4;

/// Largest accepted dual bound depth; the bound costs `(depth + 1)^3` passes.
pub const MAX_DUAL_BOUND_DEPTH: u32 = 16;

/// The answer to "does this load fit?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// Proven to fit.
    Fits,
    /// Proven not to fit.
    DoesNotFit,
    /// The time budget ran out before the exact search finished.
    Unknown,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Fits => "fits",
            Verdict::DoesNotFit => "does not fit",
            Verdict::Unknown => "unknown",
        })
    }
}

/// The pipeline stage that produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Dominance,
    Volume,
    DualBound,
    MinEdgeStack,
    CubeGrid,
    Shelf,
    Exact,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Dominance => "dominance",
            Stage::Volume => "volume",
            Stage::DualBound => "dual bound",
            Stage::MinEdgeStack => "min-edge stack",
            Stage::CubeGrid => "cube grid",
            Stage::Shelf => "shelf",
            Stage::Exact => "exact search",
        })
    }
}

/// A verdict with the stage that reached it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    pub stage: Stage,
    /// Divisor applied to every edge before deciding; 1 when none was.
    pub scale: u32,
}

impl Decision {
    fn new(verdict: Verdict, stage: Stage) -> Self {
        Self {
            verdict,
            stage,
            scale: 1,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.verdict, self.stage)?;
        if self.scale > 1 {
            write!(f, " after dividing edges by {}", self.scale)?;
        }
        Ok(())
    }
}

/// Tuning for one decision.
///
/// ```
/// use std::time::Duration;
/// use boxfit::Config;
///
/// let config = Config::new()
///     .with_time_budget(Duration::from_millis(500))
///     .with_dual_bound_depth(2);
/// assert_eq!(config.time_budget(), Some(Duration::from_millis(500)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    time_budget: Option<Duration>,
    poll_interval: u32,
    dual_bound_depth: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_budget: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
            dual_bound_depth: DEFAULT_DUAL_BOUND_DEPTH,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds the exact search; must be positive.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Search nodes between deadline checks; must be positive.
    pub fn with_poll_interval(mut self, nodes: u32) -> Self {
        self.poll_interval = nodes;
        self
    }

    /// Highest dual feasible function index tried per axis. 0 reduces the
    /// dual bound to the plain volume check.
    pub fn with_dual_bound_depth(mut self, depth: u32) -> Self {
        self.dual_bound_depth = depth;
        self
    }

    pub fn time_budget(&self) -> Option<Duration> {
        self.time_budget
    }

    pub fn poll_interval(&self) -> u32 {
        self.poll_interval
    }

    pub fn dual_bound_depth(&self) -> u32 {
        self.dual_bound_depth
    }

    fn validate(&self) -> Result<()> {
        if self.time_budget.is_some_and(|budget| budget.is_zero()) {
            return Err(Error::InvalidArgument("time budget must be positive".into()));
        }
        if self.poll_interval == 0 {
            return Err(Error::InvalidArgument("poll interval must be positive".into()));
        }
        if self.dual_bound_depth > MAX_DUAL_BOUND_DEPTH {
            return Err(Error::InvalidArgument(format!(
                "dual bound depth {} exceeds {MAX_DUAL_BOUND_DEPTH}",
                self.dual_bound_depth
            )));
        }
        Ok(())
    }
}

/// Decides whether `items` pack into `container`, and how that was settled.
///
/// The deadline, if any, starts when this is called.
pub fn decide(container: &Cuboid, items: &[Cuboid], config: &Config) -> Result<Decision> {
    config.validate()?;
    // a budget too large to add to `now` never expires
    let deadline = config
        .time_budget
        .and_then(|budget| Instant::now().checked_add(budget));

    let decision = run(container, items, config, deadline, true)?;
    debug!(
        container = %container,
        items = items.len(),
        verdict = %decision.verdict,
        stage = %decision.stage,
        scale = decision.scale,
        "decided"
    );
    Ok(decision)
}

/// Whether `items` pack into `container`.
///
/// `false` covers both "proven not to fit" and "not proven within the
/// budget"; use [`decide`] to tell them apart.
///
/// ```
/// use boxfit::{can_fit, Cuboid};
///
/// let container = Cuboid::new(6, 4, 4)?;
/// let items = [Cuboid::new(4, 4, 2)?, Cuboid::new(4, 2, 4)?];
/// assert!(can_fit(&container, &items, None)?);
/// # Ok::<(), boxfit::Error>(())
/// ```
pub fn can_fit(container: &Cuboid, items: &[Cuboid], time_budget: Option<Duration>) -> Result<bool> {
    let mut config = Config::new();
    if let Some(budget) = time_budget {
        config = config.with_time_budget(budget);
    }
    Ok(decide(container, items, &config)?.verdict == Verdict::Fits)
}

fn run(
    container: &Cuboid,
    items: &[Cuboid],
    config: &Config,
    deadline: Option<Instant>,
    may_scale: bool,
) -> Result<Decision> {
    if let Some(index) = bounds::dominance_violation(container, items) {
        debug!(item = index, edges = %items[index], "item cannot fit on its own");
        return Ok(Decision::new(Verdict::DoesNotFit, Stage::Dominance));
    }
    if bounds::exceeds_volume(container, items) {
        debug!(
            load = %bounds::total_volume(items),
            capacity = container.volume(),
            "items outweigh the container"
        );
        return Ok(Decision::new(Verdict::DoesNotFit, Stage::Volume));
    }
    if let Some(ks) = bounds::dual_bound_violation(container, items, config.dual_bound_depth) {
        debug!(?ks, "dual bound exceeded");
        return Ok(Decision::new(Verdict::DoesNotFit, Stage::DualBound));
    }

    if heuristics::min_edge_stack(container, items) {
        return Ok(Decision::new(Verdict::Fits, Stage::MinEdgeStack));
    }
    if heuristics::cube_grid(container, items) {
        return Ok(Decision::new(Verdict::Fits, Stage::CubeGrid));
    }
    if heuristics::shelf(container, items) {
        return Ok(Decision::new(Verdict::Fits, Stage::Shelf));
    }

    if may_scale {
        let divisor = reduce::common_divisor(container, items);
        if divisor > 1 {
            let (container, items) = reduce::scale_down(container, items, divisor)?;
            debug!(divisor, reduced = %container, "rerunning on the reduced instance");
            let decision = run(&container, &items, config, deadline, false)?;
            return Ok(Decision {
                scale: divisor,
                ..decision
            });
        }
    }

    Ok(exact(container, items, config, deadline))
}

fn exact(container: &Cuboid, items: &[Cuboid], config: &Config, deadline: Option<Instant>) -> Decision {
    let limits = SearchLimits {
        deadline,
        poll_interval: config.poll_interval,
    };
    let started = Instant::now();
    let (outcome, stats) = solver::search(container, items, limits);

    let verdict = match &outcome {
        SearchOutcome::Feasible(layout) => {
            if enabled!(Level::TRACE) {
                trace!("witness in {container}:\n{}", format_layout(layout));
            }
            Verdict::Fits
        }
        SearchOutcome::Infeasible => Verdict::DoesNotFit,
        SearchOutcome::TimedOut => Verdict::Unknown,
    };
    debug!(
        items = items.len(),
        nodes = stats.nodes,
        failures = stats.failures,
        elapsed_us = started.elapsed().as_micros() as u64,
        verdict = %verdict,
        "exact search finished"
    );

    Decision::new(verdict, Stage::Exact)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use proptest::prelude::*;
    use tracing_subscriber::fmt::SubscriberBuilder;

    use super::*;
    use crate::scenarios::{self, SCENARIOS};

    fn cuboid(w: u32, h: u32, l: u32) -> Cuboid {
        Cuboid::new(w, h, l).unwrap()
    }

    fn decide_scenario(name: &str) -> Decision {
        let scenario = scenarios::find(name).unwrap();
        decide(
            &scenario.container().unwrap(),
            &scenario.items().unwrap(),
            &Config::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_scenarios_match_expectations() {
        for scenario in SCENARIOS {
            let container = scenario.container().unwrap();
            let items = scenario.items().unwrap();
            let fits = can_fit(&container, &items, None).unwrap();
            assert_eq!(fits, scenario.expected, "scenario {}", scenario.name);
        }
    }

    #[test]
    fn test_deciding_stages() {
        let expected = [
            ("needles", Verdict::Fits, Stage::MinEdgeStack),
            ("overfull", Verdict::DoesNotFit, Stage::Volume),
            ("oversized_slab", Verdict::DoesNotFit, Stage::Dominance),
            ("three_cubes", Verdict::DoesNotFit, Stage::DualBound),
            ("rotation_required", Verdict::Fits, Stage::MinEdgeStack),
            ("twenty_sevens", Verdict::DoesNotFit, Stage::DualBound),
            ("dimension_mismatch", Verdict::DoesNotFit, Stage::Volume),
            ("octet", Verdict::Fits, Stage::CubeGrid),
            ("unit_cubes_and_bar", Verdict::Fits, Stage::Shelf),
            ("slice_stack", Verdict::Fits, Stage::Shelf),
            ("crowded_cubes", Verdict::DoesNotFit, Stage::DualBound),
            ("pinwheel", Verdict::Fits, Stage::Exact),
            ("pinwheel_with_centre", Verdict::Fits, Stage::Exact),
            ("mixed_bars", Verdict::Fits, Stage::Exact),
            ("mixed_bars_full", Verdict::Fits, Stage::Exact),
        ];
        for (name, verdict, stage) in expected {
            let decision = decide_scenario(name);
            assert_eq!((decision.verdict, decision.stage), (verdict, stage), "{name}");
            assert_eq!(decision.scale, 1, "{name}");
        }
    }

    #[test]
    fn test_common_divisor_reduces_before_search() {
        let decision = decide_scenario("scaled_pinwheel");
        assert_eq!(
            decision,
            Decision {
                verdict: Verdict::Fits,
                stage: Stage::Exact,
                scale: 2,
            }
        );
    }

    #[test]
    fn test_exact_search_rejects_what_the_bounds_miss() {
        // with the dual bound disabled only the search can rule this out
        let config = Config::new().with_dual_bound_depth(0);
        let items = vec![cuboid(3, 3, 3); 3];
        let decision = decide(&cuboid(5, 5, 5), &items, &config).unwrap();
        assert_eq!(decision.verdict, Verdict::DoesNotFit);
        assert_eq!(decision.stage, Stage::Exact);
    }

    #[test]
    fn test_empty_load_fits() {
        assert!(can_fit(&cuboid(1, 1, 1), &[], None).unwrap());
    }

    #[test]
    fn test_zero_budget_is_rejected() {
        let result = can_fit(&cuboid(5, 5, 5), &[cuboid(1, 1, 1)], Some(Duration::ZERO));
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let container = cuboid(5, 5, 5);
        let poll = Config::new().with_poll_interval(0);
        assert!(matches!(decide(&container, &[], &poll), Err(Error::InvalidArgument(_))));
        let depth = Config::new().with_dual_bound_depth(MAX_DUAL_BOUND_DEPTH + 1);
        assert!(matches!(decide(&container, &[], &depth), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_thousands_of_items_stop_within_budget() {
        let container = cuboid(5, 12000, 1);
        let items = vec![cuboid(3, 2, 1); 6000];
        let config = Config::new().with_time_budget(Duration::from_millis(200));
        let decision = decide(&container, &items, &config).unwrap();
        assert_eq!(decision.stage, Stage::Exact);
        assert_ne!(decision.verdict, Verdict::DoesNotFit);
    }

    #[test]
    fn test_volume_rejection_is_logged() {
        let scenario = scenarios::find("overfull").unwrap();
        let (container, items) = (scenario.container().unwrap(), scenario.items().unwrap());
        let logs = captured_logs(|| {
            decide(&container, &items, &Config::new()).unwrap();
        });
        assert!(logs.contains("items outweigh the container"), "{logs}");
        assert!(logs.contains("load=28 capacity=27"), "{logs}");
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Debug-level log text emitted while `run` executes.
    fn captured_logs(run: impl FnOnce()) -> String {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, run);
        let bytes = buffer.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_huge_budget_means_no_deadline() {
        let scenario = scenarios::find("pinwheel").unwrap();
        let fits = can_fit(
            &scenario.container().unwrap(),
            &scenario.items().unwrap(),
            Some(Duration::MAX),
        )
        .unwrap();
        assert!(fits);
    }

    #[test]
    fn test_expired_budget_is_unknown() {
        // the exact search is the only stage that looks at the clock
        let config = Config::new()
            .with_dual_bound_depth(0)
            .with_time_budget(Duration::from_nanos(1))
            .with_poll_interval(1);
        let items = vec![cuboid(7, 7, 7); 20];
        let decision = decide(&cuboid(20, 20, 20), &items, &config).unwrap();
        assert_eq!(decision.verdict, Verdict::Unknown);
        assert_eq!(decision.stage, Stage::Exact);
        assert!(!can_fit(&cuboid(20, 20, 20), &items, Some(Duration::from_nanos(1))).unwrap());
    }

    #[test]
    fn test_decision_display() {
        let decision = decide_scenario("scaled_pinwheel");
        insta::assert_snapshot!(decision.to_string(), @"fits (exact search) after dividing edges by 2");
        insta::assert_snapshot!(decide_scenario("overfull").to_string(), @"does not fit (volume)");
    }

    fn cuboid_up_to(max: u32) -> impl Strategy<Value = Cuboid> {
        (1..=max, 1..=max, 1..=max).prop_map(|(w, h, l)| Cuboid::new(w, h, l).unwrap())
    }

    fn fits(container: &Cuboid, items: &[Cuboid]) -> bool {
        can_fit(container, items, None).unwrap()
    }

    fn exact_fits(container: &Cuboid, items: &[Cuboid]) -> bool {
        let limits = SearchLimits {
            deadline: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        };
        matches!(solver::search(container, items, limits).0, SearchOutcome::Feasible(_))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn permutation_invariance(
            container in cuboid_up_to(6),
            (items, shuffled) in prop::collection::vec(cuboid_up_to(4), 0..=4)
                .prop_flat_map(|items| (Just(items.clone()), Just(items).prop_shuffle())),
        ) {
            prop_assert_eq!(fits(&container, &items), fits(&container, &shuffled));
        }

        #[test]
        fn monotonicity(
            container in cuboid_up_to(6),
            items in prop::collection::vec(cuboid_up_to(4), 1..=4),
        ) {
            if fits(&container, &items) {
                for skipped in 0..items.len() {
                    let mut subset = items.clone();
                    subset.remove(skipped);
                    prop_assert!(fits(&container, &subset));
                }
            }
        }

        #[test]
        fn volume_and_dominance_are_necessary(
            container in cuboid_up_to(5),
            items in prop::collection::vec(cuboid_up_to(6), 1..=4),
        ) {
            let overfull = bounds::exceeds_volume(&container, &items);
            let oversized = items.iter().any(|item| !item.fits_alone_in(&container));
            if overfull || oversized {
                prop_assert!(!fits(&container, &items));
            }
        }

        #[test]
        fn scale_invariance(
            container in cuboid_up_to(5),
            items in prop::collection::vec(cuboid_up_to(4), 1..=3),
            factor in 2u32..=3,
        ) {
            let scaled_container = container.scale_up(factor).unwrap();
            let scaled_items: Vec<Cuboid> =
                items.iter().map(|item| item.scale_up(factor).unwrap()).collect();
            prop_assert_eq!(fits(&container, &items), fits(&scaled_container, &scaled_items));
        }

        #[test]
        fn heuristics_only_accept_packable_loads(
            container in cuboid_up_to(6),
            items in prop::collection::vec(cuboid_up_to(4), 1..=4),
        ) {
            prop_assume!(bounds::dominance_violation(&container, &items).is_none());
            let claimed = heuristics::min_edge_stack(&container, &items)
                || heuristics::cube_grid(&container, &items)
                || heuristics::shelf(&container, &items);
            if claimed {
                prop_assert!(exact_fits(&container, &items));
            }
        }

        #[test]
        fn dual_bound_only_rejects_unpackable_loads(
            container in cuboid_up_to(6),
            items in prop::collection::vec(cuboid_up_to(4), 1..=4),
        ) {
            if bounds::dual_bound_violation(&container, &items, DEFAULT_DUAL_BOUND_DEPTH).is_some() {
                prop_assert!(!exact_fits(&container, &items));
            }
        }
    }
}
