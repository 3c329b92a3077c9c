// Copyright  (C) 2020, Kisio Digital and/or its affiliates. All rights reserved.
//
// This file is part of Navitia,
// the software to build cool stuff with public transport.
//
// Hope you'll enjoy and contribute to this project,
// powered by Kisio Digital (www.kisio.com).
// Help us simplify mobility and open public transport:
// a non ending quest to the responsive locomotion way of traveling!
//
// This contribution is a part of the research and development work of the
// IVA Project which aims to enhance traveler information and is carried out
// under the leadership of the Technological Research Institute SystemX,
// with the partnership and support of the transport organization authority
// Ile-De-France Mobilités (IDFM), SNCF, and public funds
// under the scope of the French Program "Investissements d’Avenir".
//
// LICENCE: This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.
//
// Stay tuned using
// twitter @navitia
// channel `#navitia` on riot https://riot.im/app/#/room/#navitia:matrix.org
// https://groups.google.com/d/forum/navitia
// www.navitia.io

//! Round based search.
//!
//! Round 0 seeds the start locations. Round `k` scans the routes serving
//! locations improved in round `k-1`, then applies transfers and footpaths
//! from the locations reached by vehicle. A journey found in round `k`
//! uses exactly `k` vehicles.
//!
//! Every time handled here is a `DeltaTime` relative to the midnight of the
//! day of the query instant. A backward search runs the same algorithm
//! with time flowing backward : routes are scanned from their last stop,
//! departures and arrivals are swapped, and footpaths are taken in reverse.

use super::state::{RaptorState, MAX_ROUNDS};
use crate::footpath::{for_each_td_walk, Footpath, TdFootpath};
use crate::request::{BadRequest, Offset, Query, StartTime, ViaStop};
use crate::response::Journey;
use crate::time::{
    DayIdx, DeltaTime, Direction, PositiveDuration, UnixTime, MAX_DAYS_IN_TRIP, MINUTES_IN_DAY,
};
use crate::transit_data::{EventType, LocationIdx, RouteIdx, Timetable, TransportIdx};
use std::cmp::max;
use tracing::{debug, trace, warn};

/// A transport running on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Trip {
    pub(super) transport: TransportIdx,
    pub(super) day: DayIdx,
}

/// A location reached by vehicle (or seeded in round 0) at a via level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Arrival {
    pub(super) location: LocationIdx,
    pub(super) level: usize,
    pub(super) time: DeltaTime,
}

/// A walk between two locations, times in search order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Walk {
    pub(super) from: LocationIdx,
    pub(super) to: LocationIdx,
    pub(super) start: DeltaTime,
    pub(super) end: DeltaTime,
}

/// Best way to the destination found during a round.
#[derive(Debug, Clone, Copy)]
pub(super) struct DestinationHit {
    pub(super) from: Arrival,
    pub(super) walk: Option<Walk>,
    /// where the egress begins, reached at `time`
    pub(super) location: LocationIdx,
    pub(super) time: DeltaTime,
    pub(super) egress: Offset,
    pub(super) destination_time: DeltaTime,
}

pub struct Raptor<'a, const LEVELS: usize> {
    pub(super) timetable: &'a Timetable,
    pub(super) state: &'a mut RaptorState<LEVELS>,
    pub(super) query: &'a Query,
    pub(super) direction: Direction,
    // in search order
    pub(super) vias: Vec<ViaStop>,
    max_rounds: usize,
    rounds_run: usize,

    pub(super) base_day: DayIdx,
    pub(super) start_delta: DeltaTime,
    destination_hits: [Option<DestinationHit>; MAX_ROUNDS],
    best_destination: DeltaTime,
}

impl<'a, const LEVELS: usize> Raptor<'a, LEVELS> {
    /// Checks `query` and prepares a search.
    /// Nothing is written in `state` when an error is returned.
    pub fn new(
        timetable: &'a Timetable,
        state: &'a mut RaptorState<LEVELS>,
        query: &'a Query,
    ) -> Result<Self, BadRequest> {
        query.validate(timetable, LEVELS - 1)?;
        if !state.is_sized_for(timetable.nb_of_locations(), timetable.nb_of_routes()) {
            return Err(BadRequest::StateNotSized);
        }
        let direction = query.direction;
        let mut vias = query.via_stops.clone();
        if !direction.is_forward() {
            vias.reverse();
        }
        Ok(Self {
            timetable,
            state,
            query,
            direction,
            vias,
            max_rounds: usize::from(query.max_transfers) + 2,
            rounds_run: 0,
            base_day: timetable.calendar().first_day(),
            start_delta: DeltaTime::INFEASIBLE,
            destination_hits: [None; MAX_ROUNDS],
            best_destination: DeltaTime::INFEASIBLE,
        })
    }

    /// Number of rounds run by the last search, round 0 excluded.
    pub fn rounds_run(&self) -> usize {
        self.rounds_run
    }

    /// Round times of the last search.
    pub fn state(&self) -> &RaptorState<LEVELS> {
        self.state
    }

    /// Runs the query, and returns the journeys found sorted by departure.
    ///
    /// On an interval, one search is run for each instant at which a
    /// transport can be caught from (or reached at) the start locations,
    /// and only the journeys that are not dominated on departure, arrival
    /// and number of transfers are kept.
    pub fn run(&mut self) -> Vec<Journey> {
        let mut journeys = match self.query.start_time {
            StartTime::Instant(instant) => self.search_from(instant),
            StartTime::Interval { from, to } => {
                let instants = self.start_instants(from, to);
                debug!(
                    "Interval search from {} to {} : {} start instants",
                    from,
                    to,
                    instants.len()
                );
                let mut journeys = Vec::new();
                for instant in instants {
                    journeys.extend(self.search_from(instant));
                }
                pareto_filter(journeys)
            }
        };
        journeys.sort_by_key(journey_key);
        journeys
    }

    /// Runs a single search starting at `instant`.
    pub fn search_from(&mut self, instant: UnixTime) -> Vec<Journey> {
        let timetable = self.timetable;
        let calendar = timetable.calendar();
        let base_day = match calendar.day_idx_mam(&instant) {
            Some((day, _)) => day,
            None => {
                warn!("Cannot search from {}, out of the timetable period.", instant);
                return Vec::new();
            }
        };
        self.base_day = base_day;
        self.start_delta = calendar.to_delta(base_day, &instant);
        self.destination_hits = [None; MAX_ROUNDS];
        self.best_destination = DeltaTime::INFEASIBLE;

        self.state.reset();
        for offset in &self.query.destination {
            self.state.end_reachable.insert(offset.location.idx());
        }

        self.seed();
        self.rounds_run = 0;
        for round in 1..self.max_rounds {
            let routes = self.marked_routes();
            self.state.rotate_marks();
            trace!(
                "Round {} : {} stations marked, {} routes to scan",
                round,
                self.state.prev_station_mark.count_ones(..),
                routes.len()
            );
            for route in routes {
                self.scan_route(round, route);
            }
            self.transfer_phase(round);
            self.state.finish_round(round, self.direction);
            self.rounds_run = round;
            if !self.state.any_station_marked() {
                break;
            }
        }

        let mut journeys = Vec::new();
        for round in 1..self.max_rounds {
            if let Some(hit) = self.destination_hits[round] {
                match self.reconstruct(round, &hit) {
                    Some(journey) => journeys.push(journey),
                    None => debug!("Journey with {} vehicles discarded", round),
                }
            }
        }
        debug!(
            "{} search from {} with {} vias : {} rounds, {} journeys",
            self.direction,
            instant,
            self.vias.len(),
            self.rounds_run,
            journeys.len()
        );
        journeys
    }

    fn seed(&mut self) {
        let direction = self.direction;
        let query = self.query;
        for offset in &query.start {
            let time = direction.add(self.start_delta, offset.duration);
            let seed = Arrival {
                location: offset.location,
                level: 0,
                time,
            };
            self.reach_on_foot(0, seed, None, offset.location, 0, time);
            self.walk_from(0, seed, 0, time);
        }
        self.state.finish_round(0, direction);
    }

    fn marked_routes(&mut self) -> Vec<RouteIdx> {
        let timetable = self.timetable;
        self.state.route_mark.clear();
        let marked: Vec<usize> = self.state.station_mark.ones().collect();
        for location in marked {
            for &route in timetable.routes_at(LocationIdx::new(location)) {
                if self.is_route_allowed(route) {
                    self.state.route_mark.insert(route.idx());
                }
            }
        }
        self.state.route_mark.ones().map(RouteIdx::new).collect()
    }

    fn scan_route(&mut self, round: usize, route: RouteIdx) {
        let timetable = self.timetable;
        let direction = self.direction;
        let stops = timetable.stops_of(route);
        let nb_of_stops = stops.len();
        let mut current: [Option<Trip>; LEVELS] = [None; LEVELS];

        for step in 0..nb_of_stops {
            let position = self.position(step, nb_of_stops);
            let stop = stops[position];
            let location = stop.location();
            let is_first = step == 0;

            if !is_first && stop.can_finish(direction) {
                for level in 0..LEVELS {
                    if let Some(trip) = current[level] {
                        let time = self.event_delta(route, trip, position, self.alight_event());
                        self.improve_arrival(location, level, time);
                    }
                }
            }

            if step + 1 == nb_of_stops {
                break;
            }

            if !is_first {
                for level in 0..LEVELS - 1 {
                    let via = match self.via_at(level, location) {
                        Some(via) if via.stay == PositiveDuration::zero() => via,
                        _ => continue,
                    };
                    if let Some(trip) = current[level] {
                        let replace = match current[level + 1] {
                            None => true,
                            Some(other) => direction.is_better(
                                self.event_delta(route, trip, position, self.alight_event()),
                                self.event_delta(route, other, position, self.alight_event()),
                            ),
                        };
                        if replace {
                            trace!("Riding through via {} on {}", via.location, route);
                            current[level + 1] = Some(trip);
                        }
                    }
                }
            }

            if !self.can_leave(route, position) {
                current = [None; LEVELS];
                continue;
            }

            if !stop.can_start(direction) {
                continue;
            }
            for level in 0..LEVELS {
                let ready = self.state.round_times_start[(round - 1, location.idx())][level];
                if !ready.is_feasible() {
                    continue;
                }
                let current_time = current[level]
                    .map(|trip| self.event_delta(route, trip, position, self.board_event()));
                if let Some(current_time) = current_time {
                    // no transport of the route can be caught earlier than the current one
                    if !direction.is_better(ready, current_time) {
                        continue;
                    }
                }
                if let Some((trip, time)) = self.first_trip(route, position, ready) {
                    let improves = current_time.map_or(true, |current_time| {
                        direction.is_better(time, current_time)
                    });
                    if improves {
                        current[level] = Some(trip);
                    }
                }
            }
        }
    }

    /// The best trip of `route` that can be caught at `position` by someone
    /// ready at `ready`, along with its boarding time.
    pub(super) fn first_trip(
        &self,
        route: RouteIdx,
        position: usize,
        ready: DeltaTime,
    ) -> Option<(Trip, DeltaTime)> {
        let ready = i32::from(ready.get()?);
        let timetable = self.timetable;
        let nb_of_days = usize::from(timetable.calendar().nb_of_days());
        let times = timetable.event_times_at_stop(route, position, self.board_event());
        let transports = timetable.transports_of(route);
        let ready_day = ready.div_euclid(MINUTES_IN_DAY);
        let max_days = i32::from(MAX_DAYS_IN_TRIP);
        let days = match self.direction {
            Direction::Forward => (ready_day - max_days + 1)..=(ready_day + 1),
            Direction::Backward => (ready_day - max_days + 1)..=ready_day,
        };

        let mut best: Option<(Trip, DeltaTime)> = None;
        for day_offset in days {
            let day = match self.base_day.checked_add(day_offset) {
                Some(day) if day.idx() < nb_of_days => day,
                _ => continue,
            };
            let threshold = ready - day_offset * MINUTES_IN_DAY;
            let is_active = |column: &usize| {
                let transport = TransportIdx::new(transports.from().idx() + column);
                timetable.is_active(transport, day)
            };
            let column = match self.direction {
                Direction::Forward => {
                    let from = times.partition_point(|time| i32::from(time.minutes()) < threshold);
                    (from..times.len()).find(is_active)
                }
                Direction::Backward => {
                    let to = times.partition_point(|time| i32::from(time.minutes()) <= threshold);
                    (0..to).rev().find(is_active)
                }
            };
            if let Some(column) = column {
                let time = DeltaTime::from_minutes(
                    day_offset * MINUTES_IN_DAY + i32::from(times[column].minutes()),
                );
                let is_best = best.map_or(true, |(_, best_time)| {
                    self.direction.is_better(time, best_time)
                });
                if is_best {
                    let trip = Trip {
                        transport: TransportIdx::new(transports.from().idx() + column),
                        day,
                    };
                    best = Some((trip, time));
                }
            }
        }
        best
    }

    fn transfer_phase(&mut self, round: usize) {
        self.state.rotate_marks();
        let marked: Vec<usize> = self.state.prev_station_mark.ones().collect();
        for idx in marked {
            let location = LocationIdx::new(idx);
            for level in 0..LEVELS {
                let time = self.state.tmp[idx][level];
                if time.is_feasible() {
                    self.alight(round, Arrival { location, level, time });
                }
            }
        }
    }

    // Leaves the vehicle at `arrival`, possibly staying at vias there.
    fn alight(&mut self, round: usize, arrival: Arrival) {
        let direction = self.direction;
        let transfer_time = self.timetable.locations().transfer_time(arrival.location);
        let mut level = arrival.level;
        let mut stay = PositiveDuration::zero();
        loop {
            let time = direction.add(arrival.time, stay);
            self.reach_destination(round, arrival, None, arrival.location, level, time);
            let ready = direction.add(arrival.time, max(stay, transfer_time));
            self.improve_start(round, arrival.location, level, ready);
            self.walk_from(round, arrival, level, time);
            match self.via_at(level, arrival.location) {
                Some(via) => {
                    stay = stay + via.stay;
                    level += 1;
                }
                None => break,
            }
        }
    }

    fn walk_from(&mut self, round: usize, from: Arrival, level: usize, time: DeltaTime) {
        let direction = self.direction;
        for footpath in self.search_footpaths(from.location) {
            let walk = Walk {
                from: from.location,
                to: footpath.target(),
                start: time,
                end: direction.add(time, footpath.duration()),
            };
            self.reach_on_foot(round, from, Some(walk), walk.to, level, walk.end);
        }

        let td_footpaths = self.search_td_footpaths(from.location);
        if td_footpaths.is_empty() {
            return;
        }
        let instant = match self.timetable.calendar().to_instant(self.base_day, time) {
            Some(instant) => instant,
            None => return,
        };
        // the walk begins once the footpath is open
        for_each_td_walk(direction, td_footpaths, instant, |target, split| {
            let walk = Walk {
                from: from.location,
                to: target,
                start: direction.add(time, split.waiting_time),
                end: direction.add(time, split.total()),
            };
            self.reach_on_foot(round, from, Some(walk), walk.to, level, walk.end);
        });
    }

    fn reach_on_foot(
        &mut self,
        round: usize,
        from: Arrival,
        walk: Option<Walk>,
        location: LocationIdx,
        level: usize,
        time: DeltaTime,
    ) {
        let mut level = level;
        let mut time = time;
        loop {
            self.reach_destination(round, from, walk, location, level, time);
            self.improve_start(round, location, level, time);
            match self.via_at(level, location) {
                Some(via) => {
                    time = self.direction.add(time, via.stay);
                    level += 1;
                }
                None => break,
            }
        }
    }

    fn reach_destination(
        &mut self,
        round: usize,
        from: Arrival,
        walk: Option<Walk>,
        location: LocationIdx,
        level: usize,
        time: DeltaTime,
    ) {
        // journeys must use at least one vehicle and go through every via
        if round == 0 || level + 1 != LEVELS || !self.state.is_end_reachable(location) {
            return;
        }
        let egress = match self.egress_at(location) {
            Some(egress) => egress,
            None => return,
        };
        let destination_time = self.direction.add(time, egress.duration);
        if self.direction.is_better(destination_time, self.best_destination) {
            self.best_destination = destination_time;
            self.destination_hits[round] = Some(DestinationHit {
                from,
                walk,
                location,
                time,
                egress,
                destination_time,
            });
        }
    }

    fn improve_arrival(&mut self, location: LocationIdx, level: usize, time: DeltaTime) {
        let direction = self.direction;
        let idx = location.idx();
        if direction.is_better(time, self.state.tmp[idx][level])
            && direction.is_better(time, self.state.best[idx][level])
            && direction.is_better(time, self.best_destination)
        {
            self.state.tmp[idx][level] = time;
            self.state.station_mark.insert(idx);
        }
    }

    fn improve_start(
        &mut self,
        round: usize,
        location: LocationIdx,
        level: usize,
        time: DeltaTime,
    ) {
        let direction = self.direction;
        let idx = location.idx();
        let start = &mut self.state.round_times_start[(round, idx)][level];
        if direction.is_better(time, *start)
            && direction.is_better(time, self.state.best_start[idx][level])
            && direction.is_better(time, self.best_destination)
        {
            *start = time;
            self.state.station_mark.insert(idx);
        }
    }

    fn start_instants(&self, from: UnixTime, to: UnixTime) -> Vec<UnixTime> {
        let timetable = self.timetable;
        let direction = self.direction;
        let mut instants = Vec::new();
        for offset in &self.query.start {
            let mut reachable = vec![(offset.location, offset.duration)];
            for footpath in self.search_footpaths(offset.location) {
                reachable.push((footpath.target(), offset.duration + footpath.duration()));
            }
            for (location, lead) in reachable {
                for &route in timetable.routes_at(location) {
                    if !self.is_route_allowed(route) {
                        continue;
                    }
                    let stops = timetable.stops_of(route);
                    for (position, stop) in stops.iter().enumerate() {
                        let has_event = match direction {
                            Direction::Forward => position + 1 < stops.len(),
                            Direction::Backward => position > 0,
                        };
                        if stop.location() != location || !stop.can_start(direction) || !has_event
                        {
                            continue;
                        }
                        for transport in timetable.transports_of(route).iter() {
                            let event = self.board_event();
                            let time = timetable.event_time(route, transport, position, event);
                            for day in timetable.traffic_days(transport).days() {
                                let event = timetable.instant_of(day, time);
                                let instant = direction.opposite().add_unix(event, lead);
                                if from <= instant && instant <= to {
                                    instants.push(instant);
                                }
                            }
                        }
                    }
                }
            }
        }
        instants.sort();
        instants.dedup();
        instants
    }

    pub(super) fn is_route_allowed(&self, route: RouteIdx) -> bool {
        let timetable = self.timetable;
        if !self
            .query
            .allowed_classes
            .contains(timetable.route_clasz(route))
        {
            return false;
        }
        !self.query.require_bike_transport
            || timetable.route_bikes_allowed_on_all_sections(route)
            || timetable.route_bikes_allowed_on_some_sections(route)
    }

    /// Can the section leaving `position`, in search order, be ridden ?
    pub(super) fn can_leave(&self, route: RouteIdx, position: usize) -> bool {
        if !self.query.require_bike_transport {
            return true;
        }
        let section = match self.direction {
            Direction::Forward => position,
            Direction::Backward => position - 1,
        };
        self.timetable.bikes_allowed(route, section)
    }

    /// Position of the `step`-th stop visited when scanning a route.
    pub(super) fn position(&self, step: usize, nb_of_stops: usize) -> usize {
        match self.direction {
            Direction::Forward => step,
            Direction::Backward => nb_of_stops - 1 - step,
        }
    }

    pub(super) fn board_event(&self) -> EventType {
        match self.direction {
            Direction::Forward => EventType::Departure,
            Direction::Backward => EventType::Arrival,
        }
    }

    pub(super) fn alight_event(&self) -> EventType {
        match self.direction {
            Direction::Forward => EventType::Arrival,
            Direction::Backward => EventType::Departure,
        }
    }

    pub(super) fn event_delta(
        &self,
        route: RouteIdx,
        trip: Trip,
        position: usize,
        event_type: EventType,
    ) -> DeltaTime {
        let time = self
            .timetable
            .event_time(route, trip.transport, position, event_type);
        self.timetable
            .calendar()
            .event_delta(self.base_day, trip.day, time)
    }

    pub(super) fn via_at(&self, level: usize, location: LocationIdx) -> Option<ViaStop> {
        self.vias
            .get(level)
            .filter(|via| via.location == location)
            .copied()
    }

    /// Total stay required at `location` to go from via level `from` to `to`,
    /// `None` if some via in between is not at `location`.
    pub(super) fn via_stay(
        &self,
        location: LocationIdx,
        from: usize,
        to: usize,
    ) -> Option<PositiveDuration> {
        (from..to).try_fold(PositiveDuration::zero(), |stay, level| {
            self.via_at(level, location).map(|via| stay + via.stay)
        })
    }

    pub(super) fn egress_at(&self, location: LocationIdx) -> Option<Offset> {
        self.query
            .destination
            .iter()
            .filter(|offset| offset.location == location)
            .min_by_key(|offset| offset.duration)
            .copied()
    }

    /// Footpaths taken from `location` when searching.
    pub(super) fn search_footpaths(&self, location: LocationIdx) -> &'a [Footpath] {
        match self.direction {
            Direction::Forward => self.timetable.footpaths_out(location),
            Direction::Backward => self.timetable.footpaths_in(location),
        }
    }

    /// Footpaths leading to `location` when searching, the target of each
    /// being its origin.
    pub(super) fn reverse_footpaths(&self, location: LocationIdx) -> &'a [Footpath] {
        match self.direction {
            Direction::Forward => self.timetable.footpaths_in(location),
            Direction::Backward => self.timetable.footpaths_out(location),
        }
    }

    pub(super) fn search_td_footpaths(&self, location: LocationIdx) -> &'a [TdFootpath] {
        match self.direction {
            Direction::Forward => self.timetable.td_footpaths_out(location),
            Direction::Backward => self.timetable.td_footpaths_in(location),
        }
    }

    pub(super) fn reverse_td_footpaths(&self, location: LocationIdx) -> &'a [TdFootpath] {
        match self.direction {
            Direction::Forward => self.timetable.td_footpaths_in(location),
            Direction::Backward => self.timetable.td_footpaths_out(location),
        }
    }
}

fn journey_key(journey: &Journey) -> (UnixTime, UnixTime, u8) {
    (journey.departure, journey.arrival, journey.nb_of_transfers)
}

/// Keeps the journeys that no other journey dominates, without duplicates.
pub fn pareto_filter(mut journeys: Vec<Journey>) -> Vec<Journey> {
    journeys.sort_by_key(journey_key);
    journeys.dedup_by(|lhs, rhs| journey_key(lhs) == journey_key(rhs));
    let dominated: Vec<bool> = journeys
        .iter()
        .map(|journey| journeys.iter().any(|other| other.dominates(journey)))
        .collect();
    journeys
        .into_iter()
        .zip(dominated)
        .filter(|(_, dominated)| !dominated)
        .map(|(journey, _)| journey)
        .collect()
}

/// Runs `query` on `timetable` with `state`.
pub fn solve<const LEVELS: usize>(
    timetable: &Timetable,
    state: &mut RaptorState<LEVELS>,
    query: &Query,
) -> Result<Vec<Journey>, BadRequest> {
    let mut raptor = Raptor::new(timetable, state, query)?;
    Ok(raptor.run())
}
