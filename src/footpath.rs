//! Static and time-dependent footpaths.
//!
//! A time-dependent footpath is valid from its `valid_from` instant until
//! the `valid_from` of the next footpath to the same target. A run of such
//! footpaths to a single target is stored sorted by `valid_from`, and
//! the resolver picks the one usable instance that gives the best time
//! for a given query instant.
//!
//! A duration equal to `PositiveDuration::MAX` means the footpath is
//! withdrawn during its validity window.

use crate::time::{Direction, PositiveDuration, UnixTime};
use crate::transit_data::idx::LocationIdx;
use std::cmp::{max, min};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footpath {
    target: LocationIdx,
    duration: PositiveDuration,
}

impl Footpath {
    pub fn new(target: LocationIdx, duration: PositiveDuration) -> Self {
        Self { target, duration }
    }

    pub fn target(&self) -> LocationIdx {
        self.target
    }

    pub fn duration(&self) -> PositiveDuration {
        self.duration
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TdFootpath {
    pub target: LocationIdx,
    pub valid_from: UnixTime,
    pub duration: PositiveDuration,
}

/// Resolved time-dependent footpath : time spent walking, and time spent
/// waiting for the chosen footpath to become valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationWithWaiting {
    pub duration: PositiveDuration,
    pub waiting_time: PositiveDuration,
}

impl DurationWithWaiting {
    pub fn total(&self) -> PositiveDuration {
        self.duration.saturating_add(self.waiting_time)
    }
}

/// Resolved time-dependent footpath along with the chosen entry of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TdResult {
    pub duration_with_waiting_time: PositiveDuration,
    pub footpath: TdFootpath,
}

struct Resolved<'a> {
    footpath: &'a TdFootpath,
    duration: i64,
    waiting_time: i64,
}

fn minutes(instant: UnixTime) -> i64 {
    i64::from(instant.minutes())
}

fn duration(footpath: &TdFootpath) -> i64 {
    i64::from(footpath.duration.total_minutes())
}

const MAX_DURATION: i64 = u16::MAX as i64;

fn close_candidate<'a>(
    candidate: &'a TdFootpath,
    t: i64,
    best: &mut Option<&'a TdFootpath>,
    best_arrival: &mut i64,
) {
    let arrival = max(t, minutes(candidate.valid_from)) + duration(candidate);
    if best.is_none() || arrival < *best_arrival {
        *best = Some(candidate);
        *best_arrival = arrival;
    }
}

// The run must only contain footpaths to the same target,
// sorted by increasing `valid_from`.
fn resolve_forward(run: &[TdFootpath], t: UnixTime) -> Option<Resolved<'_>> {
    let t = minutes(t);
    let mut best: Option<&TdFootpath> = None;
    let mut best_arrival = i64::MAX;
    let mut current: Option<&TdFootpath> = None;

    for footpath in run {
        match current {
            // the next window opens once we would have arrived with
            // the current candidate : the candidate is closed
            Some(candidate)
                if candidate.duration.is_feasible()
                    && minutes(footpath.valid_from) >= t + duration(candidate) =>
            {
                close_candidate(candidate, t, &mut best, &mut best_arrival);
                current = None;
            }
            _ => current = Some(footpath),
        }
    }
    if let Some(candidate) = current {
        close_candidate(candidate, t, &mut best, &mut best_arrival);
    }

    let best = best.filter(|footpath| footpath.duration.is_feasible())?;
    let start = max(minutes(best.valid_from), t);
    Some(Resolved {
        footpath: best,
        duration: duration(best),
        waiting_time: max(start - t, 0),
    })
}

// Same preconditions on the run as `resolve_forward`,
// which is scanned from the last entry to the first one.
fn resolve_backward(run: &[TdFootpath], t: UnixTime) -> Option<Resolved<'_>> {
    let t = minutes(t);
    let last = run.last()?;
    let mut best: Option<&TdFootpath> = None;
    let mut departure = minutes(UnixTime::EPOCH);

    if last.duration.is_feasible() && minutes(last.valid_from) <= t - duration(last) {
        best = Some(last);
        departure = t - duration(last);
    }

    // `successor` is the entry that follows `predecessor` in validity order
    for pair in run.windows(2).rev() {
        let (predecessor, successor) = (&pair[0], &pair[1]);
        if !predecessor.duration.is_feasible() {
            continue;
        }
        if max(minutes(predecessor.valid_from), departure) + duration(predecessor) > t {
            continue;
        }
        // [predecessor.valid_from, successor.valid_from + 1) overlaps [departure + 1, t + 1)
        let overlaps = minutes(predecessor.valid_from) < t + 1
            && departure + 1 < minutes(successor.valid_from) + 1;
        if !overlaps {
            continue;
        }
        let new_departure = min(minutes(successor.valid_from), t) - duration(predecessor);
        if departure < new_departure {
            departure = new_departure;
            best = Some(predecessor);
        }
    }

    let best = best?;
    Some(Resolved {
        footpath: best,
        duration: duration(best),
        waiting_time: max(t - (departure + duration(best)), 0),
    })
}

fn resolve(direction: Direction, run: &[TdFootpath], t: UnixTime) -> Option<Resolved<'_>> {
    let resolved = match direction {
        Direction::Forward => resolve_forward(run, t),
        Direction::Backward => resolve_backward(run, t),
    }?;
    if resolved.duration + resolved.waiting_time < MAX_DURATION {
        Some(resolved)
    } else {
        None
    }
}

/// Resolves a run of time-dependent footpaths to a single target, sorted by
/// increasing `valid_from`, at instant `t`.
///
/// - `Direction::Forward` : we leave no earlier than `t`, and minimize the
///   arrival time,
/// - `Direction::Backward` : we arrive no later than `t`, and maximize
///   the departure time.
///
/// Returns `None` when no footpath of the run can be used.
pub fn td_duration_split(
    direction: Direction,
    run: &[TdFootpath],
    t: UnixTime,
) -> Option<DurationWithWaiting> {
    let resolved = resolve(direction, run, t)?;
    // both values are below MAX_DURATION at this point
    Some(DurationWithWaiting {
        duration: PositiveDuration::from_minutes(resolved.duration as u16),
        waiting_time: PositiveDuration::from_minutes(resolved.waiting_time as u16),
    })
}

/// Same as `td_duration_split`, with walking and waiting time summed.
pub fn td_duration(
    direction: Direction,
    run: &[TdFootpath],
    t: UnixTime,
) -> Option<PositiveDuration> {
    td_duration_split(direction, run, t).map(|split| split.total())
}

/// Same as `td_duration`, along with the footpath chosen in the run.
pub fn td_result(direction: Direction, run: &[TdFootpath], t: UnixTime) -> Option<TdResult> {
    let resolved = resolve(direction, run, t)?;
    Some(TdResult {
        duration_with_waiting_time: PositiveDuration::from_minutes(
            (resolved.duration + resolved.waiting_time) as u16,
        ),
        footpath: *resolved.footpath,
    })
}

/// Resolves every target of `footpaths` at instant `t`, and calls `f`
/// with one static footpath for each target that can be reached.
///
/// `footpaths` must be sorted by target, then by `valid_from`.
pub fn for_each_footpath<F>(direction: Direction, footpaths: &[TdFootpath], t: UnixTime, mut f: F)
where
    F: FnMut(Footpath),
{
    for_each_td_walk(direction, footpaths, t, |target, split| {
        f(Footpath::new(target, split.total()))
    });
}

/// Same as `for_each_footpath`, keeping the walking and waiting times apart.
pub fn for_each_td_walk<F>(direction: Direction, footpaths: &[TdFootpath], t: UnixTime, mut f: F)
where
    F: FnMut(LocationIdx, DurationWithWaiting),
{
    let mut begin = 0;
    while begin < footpaths.len() {
        let target = footpaths[begin].target;
        let end = footpaths[begin..]
            .iter()
            .position(|footpath| footpath.target != target)
            .map_or(footpaths.len(), |len| begin + len);
        if let Some(split) = td_duration_split(direction, &footpaths[begin..end], t) {
            f(target, split);
        }
        begin = end;
    }
}
