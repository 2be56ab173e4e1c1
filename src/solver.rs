//! Exact feasibility search.
//!
//! Constraint model, for items ordered by descending volume with equal
//! shapes adjacent:
//! - each item has a lower-corner position per axis, kept as `[lo, hi]`
//! - each item has a rotation domain: a bitmask over its distinct rotations
//! - each unordered pair has a relation domain: a bitmask over six
//!   separation relations, "one box ends before the other starts" in either
//!   direction on each axis
//!
//! Boxes stay inside the container, every pair keeps at least one relation,
//! and neighbours with the same shape take lexicographically ordered
//! positions (swapping them gives the same packing).
//!
//! Key implementation points:
//! - Flat per-variable arrays instead of per-item objects
//! - Every narrowing goes on a trail; backtracking pops it
//! - Fixed-size frames on an explicit stack, no recursion
//! - Decisions follow a fixed order walked on the fly, never stored
//! - No allocation in the search loop once the trail and stack have grown
//!
//! Once every rotation and relation is decided, propagation has pushed each
//! lower bound past everything that must precede it, so putting every item
//! at its lower bounds is a packing.

use std::cmp::Reverse;
use std::time::Instant;

use tracing::debug;

use crate::cuboid::Cuboid;
use crate::geometry::Rotation;
use crate::placement::{find_conflict, Placement};

const AXES: usize = 3;

/// Relation bits per pair: bit `2 * axis` puts the lower-indexed item first
/// on `axis`, bit `2 * axis + 1` the higher-indexed one.
const RELATIONS: usize = 6;

const MAX_ROTATIONS: usize = 6;

/// Limits for one search.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchLimits {
    /// Give up once this instant has passed.
    pub deadline: Option<Instant>,
    /// Search nodes between deadline checks.
    pub poll_interval: u32,
}

impl SearchLimits {
    fn expired(&self) -> bool {
        self.deadline
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

#[derive(Debug)]
pub(crate) enum SearchOutcome {
    /// A verified packing, one placement per item.
    Feasible(Vec<Placement>),
    /// The search space is exhausted.
    Infeasible,
    /// The deadline passed first.
    TimedOut,
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SearchStats {
    pub nodes: u64,
    pub failures: u64,
}

/// Propagation emptied a domain.
#[derive(Debug)]
struct Wipeout;

type Propagation = Result<(), Wipeout>;

/// Why a propagation run stopped short of a fixpoint.
#[derive(Debug)]
enum Halt {
    Wipeout,
    Deadline,
}

impl From<Wipeout> for Halt {
    fn from(_: Wipeout) -> Self {
        Halt::Wipeout
    }
}

/// A domain value before it was narrowed.
#[derive(Clone, Copy)]
enum Undo {
    Lo(usize, i64),
    Hi(usize, i64),
    Rotation(usize, u8),
    Relation(usize, u8),
}

#[derive(Clone, Copy)]
enum Decision {
    Rotate(usize),
    Separate {
        pair: usize,
        first: usize,
        second: usize,
    },
}

/// A position in the static decision order: the rotation of `item`
/// (`slot == 0`), then its relation to each earlier item `slot - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Step {
    item: usize,
    slot: usize,
}

impl Step {
    const FIRST: Step = Step { item: 0, slot: 0 };

    fn next(self) -> Step {
        if self.slot < self.item {
            Step {
                item: self.item,
                slot: self.slot + 1,
            }
        } else {
            Step {
                item: self.item + 1,
                slot: 0,
            }
        }
    }
}

/// A choice point: the options for one decision and the next one to try.
#[derive(Clone, Copy)]
struct Frame {
    step: Step,
    /// Trail length before any option was applied.
    mark: usize,
    options: [u8; RELATIONS],
    count: u8,
    next: u8,
}

#[inline(always)]
const fn var(item: usize, axis: usize) -> usize {
    item * AXES + axis
}

/// Index of the pair `first < second` among `n` items.
#[inline(always)]
const fn pair_index(n: usize, first: usize, second: usize) -> usize {
    first * (2 * n - first - 1) / 2 + (second - first - 1)
}

/// Splits a relation bit into `(before, after, axis)`.
#[inline(always)]
const fn orient(first: usize, second: usize, bit: usize) -> (usize, usize, usize) {
    if bit % 2 == 0 {
        (first, second, bit / 2)
    } else {
        (second, first, bit / 2)
    }
}

/// Iterates the set bits of a small mask.
#[inline(always)]
fn bits(mut mask: u8) -> impl Iterator<Item = usize> {
    std::iter::from_fn(move || {
        if mask == 0 {
            return None;
        }
        let bit = mask.trailing_zeros() as usize;
        mask &= mask - 1;
        Some(bit)
    })
}

struct Model {
    container: [i64; AXES],
    n: usize,
    /// Caller's index for each model item.
    source: Vec<usize>,
    rotations: Vec<&'static [Rotation]>,
    /// `[item][rotation][axis]` extents, for the item's distinct rotations.
    extents: Vec<[[i64; AXES]; MAX_ROTATIONS]>,
    lo: Vec<i64>,
    hi: Vec<i64>,
    rotation: Vec<u8>,
    relation: Vec<u8>,
    /// Item `i` and `i + 1` have the same shape.
    same_as_next: Vec<bool>,
    trail: Vec<Undo>,
    queue: Vec<usize>,
    queued: Vec<bool>,
    limits: SearchLimits,
    /// Queue entries processed, for deadline polling.
    pops: u64,
}

impl Model {
    fn new(container: &Cuboid, items: &[Cuboid], limits: SearchLimits) -> Result<Self, Wipeout> {
        let n = items.len();
        let bound = container.edges().map(i64::from);

        // large items first, equal shapes side by side
        let mut source: Vec<usize> = (0..n).collect();
        source.sort_by_key(|&index| (Reverse(items[index].volume()), items[index].sorted()));

        let mut rotations = Vec::with_capacity(n);
        let mut extents = Vec::with_capacity(n);
        let mut rotation = Vec::with_capacity(n);
        let lo = vec![0i64; n * AXES];
        let mut hi = vec![0i64; n * AXES];

        for (item, &index) in source.iter().enumerate() {
            let cuboid = &items[index];
            let distinct = cuboid.distinct_rotations();
            let mut table = [[0i64; AXES]; MAX_ROTATIONS];
            for (slot, &turn) in table.iter_mut().zip(distinct) {
                *slot = cuboid.oriented(turn).map(i64::from);
            }
            rotations.push(distinct);
            extents.push(table);
            rotation.push(((1u16 << distinct.len()) - 1) as u8);

            for axis in 0..AXES {
                let cap = bound[axis] - i64::from(cuboid.min_edge());
                if cap < 0 {
                    return Err(Wipeout);
                }
                hi[var(item, axis)] = cap;
            }
        }

        let same_as_next = (0..n)
            .map(|item| item + 1 < n && items[source[item]].sorted() == items[source[item + 1]].sorted())
            .collect();

        Ok(Self {
            container: bound,
            n,
            source,
            rotations,
            extents,
            lo,
            hi,
            rotation,
            relation: vec![((1u16 << RELATIONS) - 1) as u8; n * n.saturating_sub(1) / 2],
            same_as_next,
            trail: Vec::with_capacity(16 * n + 64),
            queue: (0..n).collect(),
            queued: vec![true; n],
            limits,
            pops: 0,
        })
    }

    fn min_extent(&self, item: usize, axis: usize) -> i64 {
        bits(self.rotation[item])
            .map(|k| self.extents[item][k][axis])
            .min()
            .unwrap_or(i64::MAX)
    }

    fn max_extent(&self, item: usize, axis: usize) -> i64 {
        bits(self.rotation[item])
            .map(|k| self.extents[item][k][axis])
            .max()
            .unwrap_or(0)
    }

    fn schedule(&mut self, item: usize) {
        if !self.queued[item] {
            self.queued[item] = true;
            self.queue.push(item);
        }
    }

    fn raise_lo(&mut self, item: usize, axis: usize, value: i64) -> Propagation {
        let v = var(item, axis);
        if value <= self.lo[v] {
            return Ok(());
        }
        if value > self.hi[v] {
            return Err(Wipeout);
        }
        self.trail.push(Undo::Lo(v, self.lo[v]));
        self.lo[v] = value;
        self.schedule(item);
        Ok(())
    }

    fn lower_hi(&mut self, item: usize, axis: usize, value: i64) -> Propagation {
        let v = var(item, axis);
        if value >= self.hi[v] {
            return Ok(());
        }
        if value < self.lo[v] {
            return Err(Wipeout);
        }
        self.trail.push(Undo::Hi(v, self.hi[v]));
        self.hi[v] = value;
        self.schedule(item);
        Ok(())
    }

    fn restrict_rotation(&mut self, item: usize, mask: u8) -> Propagation {
        let narrowed = self.rotation[item] & mask;
        if narrowed == self.rotation[item] {
            return Ok(());
        }
        if narrowed == 0 {
            return Err(Wipeout);
        }
        self.trail.push(Undo::Rotation(item, self.rotation[item]));
        self.rotation[item] = narrowed;
        self.schedule(item);
        Ok(())
    }

    fn restrict_relation(&mut self, pair: usize, first: usize, second: usize, mask: u8) -> Propagation {
        let narrowed = self.relation[pair] & mask;
        if narrowed == self.relation[pair] {
            return Ok(());
        }
        if narrowed == 0 {
            return Err(Wipeout);
        }
        self.trail.push(Undo::Relation(pair, self.relation[pair]));
        self.relation[pair] = narrowed;
        self.schedule(first);
        self.schedule(second);
        Ok(())
    }

    fn undo(&mut self, mark: usize) {
        while self.trail.len() > mark {
            match self.trail.pop() {
                Some(Undo::Lo(v, value)) => self.lo[v] = value,
                Some(Undo::Hi(v, value)) => self.hi[v] = value,
                Some(Undo::Rotation(item, mask)) => self.rotation[item] = mask,
                Some(Undo::Relation(pair, mask)) => self.relation[pair] = mask,
                None => break,
            }
        }
    }

    /// Runs the queue to a fixpoint, emptying it either way.
    fn propagate(&mut self) -> Result<(), Halt> {
        let result = self.drain_queue();
        if result.is_err() {
            for &item in &self.queue {
                self.queued[item] = false;
            }
            self.queue.clear();
        }
        result
    }

    fn drain_queue(&mut self) -> Result<(), Halt> {
        let poll_interval = u64::from(self.limits.poll_interval.max(1));
        while let Some(item) = self.queue.pop() {
            self.queued[item] = false;
            // a single run touches every pair, so large loads poll here too
            self.pops += 1;
            if self.pops % poll_interval == 0 && self.limits.expired() {
                return Err(Halt::Deadline);
            }
            self.propagate_item(item)?;
            for other in 0..self.n {
                if other < item {
                    self.propagate_pair(other, item)?;
                } else if other > item {
                    self.propagate_pair(item, other)?;
                }
            }
            if item > 0 && self.same_as_next[item - 1] {
                self.propagate_order(item - 1)?;
            }
            if self.same_as_next[item] {
                self.propagate_order(item)?;
            }
        }
        Ok(())
    }

    /// Container bounds: drop rotations that overhang from the lower
    /// corner, then cap the corner by the shortest remaining extent.
    fn propagate_item(&mut self, item: usize) -> Propagation {
        let mut fitting = 0u8;
        for k in bits(self.rotation[item]) {
            let extent = self.extents[item][k];
            if (0..AXES).all(|axis| self.lo[var(item, axis)] + extent[axis] <= self.container[axis]) {
                fitting |= 1 << k;
            }
        }
        self.restrict_rotation(item, fitting)?;

        for axis in 0..AXES {
            let cap = self.container[axis] - self.min_extent(item, axis);
            self.lower_hi(item, axis, cap)?;
        }
        Ok(())
    }

    /// Non-overlap for one pair: drop relations the bounds rule out and
    /// enforce the last one standing.
    fn propagate_pair(&mut self, first: usize, second: usize) -> Propagation {
        let pair = pair_index(self.n, first, second);
        let mut possible = 0u8;
        let mut entailed = None;

        for bit in bits(self.relation[pair]) {
            let (before, after, axis) = orient(first, second, bit);
            let earliest_end = self.lo[var(before, axis)] + self.min_extent(before, axis);
            if earliest_end > self.hi[var(after, axis)] {
                continue;
            }
            possible |= 1 << bit;

            let latest_end = self.hi[var(before, axis)] + self.max_extent(before, axis);
            if entailed.is_none() && latest_end <= self.lo[var(after, axis)] {
                entailed = Some(bit);
            }
        }

        // already separated whatever happens below, nothing to choose
        if let Some(bit) = entailed {
            possible = 1 << bit;
        }
        self.restrict_relation(pair, first, second, possible)?;

        if possible.count_ones() == 1 {
            let (before, after, axis) = orient(first, second, possible.trailing_zeros() as usize);
            self.enforce(before, after, axis)?;
        }
        Ok(())
    }

    /// `before` ends no later than `after` starts on `axis`.
    fn enforce(&mut self, before: usize, after: usize, axis: usize) -> Propagation {
        let extent = self.min_extent(before, axis);
        let earliest_start = self.lo[var(before, axis)] + extent;
        self.raise_lo(after, axis, earliest_start)?;
        let latest_start = self.hi[var(after, axis)] - extent;
        self.lower_hi(before, axis, latest_start)?;

        let room = self.hi[var(after, axis)] - self.lo[var(before, axis)];
        let mut fitting = 0u8;
        for k in bits(self.rotation[before]) {
            if self.extents[before][k][axis] <= room {
                fitting |= 1 << k;
            }
        }
        self.restrict_rotation(before, fitting)
    }

    /// Lexicographic order between same-shaped neighbours `first` and `first + 1`.
    fn propagate_order(&mut self, first: usize) -> Propagation {
        let second = first + 1;
        for axis in 0..AXES {
            let (a, b) = (var(first, axis), var(second, axis));
            let tied = self.lo[a] == self.hi[a] && self.lo[b] == self.hi[b] && self.lo[a] == self.lo[b];
            if tied {
                continue;
            }
            let (floor, ceiling) = (self.lo[a], self.hi[b]);
            self.raise_lo(second, axis, floor)?;
            self.lower_hi(first, axis, ceiling)?;
            break;
        }
        Ok(())
    }

    fn decision(&self, step: Step) -> Decision {
        if step.slot == 0 {
            return Decision::Rotate(step.item);
        }
        let first = step.slot - 1;
        Decision::Separate {
            pair: pair_index(self.n, first, step.item),
            first,
            second: step.item,
        }
    }

    fn is_open(&self, step: Step) -> bool {
        match self.decision(step) {
            Decision::Rotate(item) => self.rotation[item].count_ones() > 1,
            Decision::Separate { pair, .. } => self.relation[pair].count_ones() > 1,
        }
    }

    fn next_open(&self, from: Step) -> Option<Step> {
        let mut step = from;
        while step.item < self.n {
            if self.is_open(step) {
                return Some(step);
            }
            step = step.next();
        }
        None
    }

    /// Rotations in table order; relations with the most slack first.
    fn frame(&self, step: Step) -> Frame {
        let mut options = [0u8; RELATIONS];
        let mut count = 0;

        match self.decision(step) {
            Decision::Rotate(item) => {
                for k in bits(self.rotation[item]) {
                    options[count] = k as u8;
                    count += 1;
                }
            }
            Decision::Separate { pair, first, second } => {
                let mut slack = [0i64; RELATIONS];
                for bit in bits(self.relation[pair]) {
                    let (before, after, axis) = orient(first, second, bit);
                    slack[count] = self.hi[var(after, axis)]
                        - self.lo[var(before, axis)]
                        - self.min_extent(before, axis);
                    options[count] = bit as u8;
                    count += 1;
                }
                for i in 1..count {
                    let mut j = i;
                    while j > 0 && slack[j - 1] < slack[j] {
                        slack.swap(j - 1, j);
                        options.swap(j - 1, j);
                        j -= 1;
                    }
                }
            }
        }

        Frame {
            step,
            mark: self.trail.len(),
            options,
            count: count as u8,
            next: 0,
        }
    }

    fn apply(&mut self, step: Step, option: u8) -> Result<(), Halt> {
        match self.decision(step) {
            Decision::Rotate(item) => self.restrict_rotation(item, 1 << option)?,
            Decision::Separate { pair, first, second } => {
                self.restrict_relation(pair, first, second, 1 << option)?
            }
        }
        self.propagate()
    }

    /// Every item at its lower bounds, checked independently.
    fn witness(&self) -> Option<Vec<Placement>> {
        let mut layout = Vec::with_capacity(self.n);
        for item in 0..self.n {
            let k = self.rotation[item].trailing_zeros() as usize;
            layout.push(Placement {
                item: self.source[item],
                rotation: self.rotations[item][k],
                extent: self.extents[item][k].map(|extent| extent as u32),
                origin: [0, 1, 2].map(|axis| self.lo[var(item, axis)] as u32),
            });
        }
        let bound = self.container.map(|edge| edge as u32);
        if let Some(conflict) = find_conflict(bound, &layout) {
            debug!(%conflict, "witness rejected");
            return None;
        }
        Some(layout)
    }
}

/// Decides whether `items` pack into `container`.
///
/// Uses iterative backtracking over an explicit stack of choice points.
pub(crate) fn search(
    container: &Cuboid,
    items: &[Cuboid],
    limits: SearchLimits,
) -> (SearchOutcome, SearchStats) {
    let mut stats = SearchStats::default();

    let Ok(mut model) = Model::new(container, items, limits) else {
        return (SearchOutcome::Infeasible, stats);
    };
    match model.propagate() {
        Ok(()) => {}
        Err(Halt::Wipeout) => return (SearchOutcome::Infeasible, stats),
        Err(Halt::Deadline) => return (SearchOutcome::TimedOut, stats),
    }

    let mut stack: Vec<Frame> = Vec::new();
    match model.next_open(Step::FIRST) {
        Some(step) => stack.push(model.frame(step)),
        None => {
            let outcome = model
                .witness()
                .map_or(SearchOutcome::Infeasible, SearchOutcome::Feasible);
            return (outcome, stats);
        }
    }

    let poll_interval = u64::from(limits.poll_interval.max(1));

    while let Some(frame) = stack.last_mut() {
        stats.nodes += 1;
        if stats.nodes % poll_interval == 0 && limits.expired() {
            return (SearchOutcome::TimedOut, stats);
        }

        if frame.next == frame.count {
            // options exhausted, backtrack to the parent
            let mark = frame.mark;
            stack.pop();
            model.undo(mark);
            continue;
        }

        let option = frame.options[frame.next as usize];
        frame.next += 1;
        let (step, mark) = (frame.step, frame.mark);

        model.undo(mark);
        match model.apply(step, option) {
            Ok(()) => {}
            Err(Halt::Wipeout) => {
                stats.failures += 1;
                continue;
            }
            Err(Halt::Deadline) => return (SearchOutcome::TimedOut, stats),
        }

        match model.next_open(step.next()) {
            Some(next) => stack.push(model.frame(next)),
            None => match model.witness() {
                Some(layout) => return (SearchOutcome::Feasible(layout), stats),
                None => stats.failures += 1,
            },
        }
    }

    (SearchOutcome::Infeasible, stats)
}
