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

use super::raptor::{Arrival, DestinationHit, Raptor, Trip, Walk};
use crate::footpath::{td_duration_split, TdFootpath};
use crate::request::Offset;
use crate::response::{Journey, Leg, LegKind};
use crate::time::{DeltaTime, Direction, PositiveDuration, MINUTES_IN_DAY};
use crate::transit_data::{LocationIdx, RouteIdx, TransportIdx};
use std::cmp::max;
use tracing::debug;

/// A leg with its times in search order.
struct SearchLeg {
    from: LocationIdx,
    to: LocationIdx,
    from_time: DeltaTime,
    to_time: DeltaTime,
    kind: LegKind,
}

/// How someone got ready to board at a location.
enum Predecessor {
    Seed { offset: Offset, walk: Option<Walk> },
    Vehicle { arrival: Arrival, walk: Option<Walk> },
}

fn walk_leg(walk: &Walk) -> SearchLeg {
    SearchLeg {
        from: walk.from,
        to: walk.to,
        from_time: walk.start,
        to_time: walk.end,
        kind: LegKind::Footpath,
    }
}

// the entries of `footpaths` going to `target`
fn td_run(footpaths: &[TdFootpath], target: LocationIdx) -> &[TdFootpath] {
    let begin = footpaths.partition_point(|footpath| footpath.target < target);
    let end = footpaths.partition_point(|footpath| footpath.target <= target);
    &footpaths[begin..end]
}

impl<'a, const LEVELS: usize> Raptor<'a, LEVELS> {
    /// Walks the rounds back from `hit`, found in round `round`.
    pub(super) fn reconstruct(&self, round: usize, hit: &DestinationHit) -> Option<Journey> {
        let direction = self.direction;
        let mut legs = vec![SearchLeg {
            from: hit.location,
            to: hit.location,
            from_time: hit.time,
            to_time: hit.destination_time,
            kind: LegKind::Offset {
                transport_mode_id: hit.egress.transport_mode_id,
            },
        }];
        if let Some(walk) = &hit.walk {
            legs.push(walk_leg(walk));
        }

        let mut arrival = hit.from;
        for k in (1..=round).rev() {
            let (leg, predecessor) = self.vehicle_leg(k, &arrival)?;
            legs.push(leg);
            match predecessor {
                Predecessor::Vehicle {
                    arrival: previous,
                    walk,
                } => {
                    if let Some(walk) = &walk {
                        legs.push(walk_leg(walk));
                    }
                    arrival = previous;
                }
                Predecessor::Seed { offset, walk } => {
                    debug_assert_eq!(k, 1);
                    if let Some(walk) = &walk {
                        legs.push(walk_leg(walk));
                    }
                    legs.push(SearchLeg {
                        from: offset.location,
                        to: offset.location,
                        from_time: self.start_delta,
                        to_time: direction.add(self.start_delta, offset.duration),
                        kind: LegKind::Offset {
                            transport_mode_id: offset.transport_mode_id,
                        },
                    });
                }
            }
        }

        // legs are in reverse search order
        if direction.is_forward() {
            legs.reverse();
        }
        let calendar = self.timetable.calendar();
        let instant = |time: DeltaTime| calendar.to_instant(self.base_day, time);
        let legs = legs
            .into_iter()
            .map(|leg| {
                let from_instant = instant(leg.from_time)?;
                let to_instant = instant(leg.to_time)?;
                Some(match direction {
                    Direction::Forward => Leg {
                        from: leg.from,
                        to: leg.to,
                        departure: from_instant,
                        arrival: to_instant,
                        kind: leg.kind,
                    },
                    Direction::Backward => Leg {
                        from: leg.to,
                        to: leg.from,
                        departure: to_instant,
                        arrival: from_instant,
                        kind: leg.kind,
                    },
                })
            })
            .collect::<Option<Vec<Leg>>>()?;

        let start = instant(self.start_delta)?;
        let end = instant(hit.destination_time)?;
        let (departure, arrival) = match direction {
            Direction::Forward => (start, end),
            Direction::Backward => (end, start),
        };
        let journey = Journey {
            departure,
            arrival,
            nb_of_transfers: (round - 1) as u8,
            legs,
        };
        if self.respects_max_stays(&journey) {
            Some(journey)
        } else {
            debug!(
                "Journey arriving at {} stays too long at a via",
                journey.arrival
            );
            None
        }
    }

    // The vehicle leg of round `round` ending at `arrival`.
    fn vehicle_leg(&self, round: usize, arrival: &Arrival) -> Option<(SearchLeg, Predecessor)> {
        let timetable = self.timetable;
        let direction = self.direction;
        for &route in timetable.routes_at(arrival.location) {
            if !self.is_route_allowed(route) {
                continue;
            }
            let stops = timetable.stops_of(route);
            let nb_of_stops = stops.len();
            for alight_step in 1..nb_of_stops {
                let alight_position = self.position(alight_step, nb_of_stops);
                let alight_stop = stops[alight_position];
                if alight_stop.location() != arrival.location || !alight_stop.can_finish(direction)
                {
                    continue;
                }
                for transport in timetable.transports_of(route).iter() {
                    let trip =
                        match self.trip_arriving_at(route, transport, alight_position, arrival) {
                            Some(trip) => trip,
                            None => continue,
                        };
                    for board_step in (0..alight_step).rev() {
                        let board_position = self.position(board_step, nb_of_stops);
                        if !self.can_leave(route, board_position) {
                            break;
                        }
                        let board_stop = stops[board_position];
                        if !board_stop.can_start(direction) {
                            continue;
                        }
                        let board_time =
                            self.event_delta(route, trip, board_position, self.board_event());
                        for board_level in (0..=arrival.level).rev() {
                            let rides_through = self.rides_through(
                                route,
                                board_step,
                                alight_step,
                                board_level,
                                arrival.level,
                            );
                            if !rides_through {
                                continue;
                            }
                            let predecessor = self.predecessor(
                                round - 1,
                                board_stop.location(),
                                board_level,
                                board_time,
                            );
                            if let Some(predecessor) = predecessor {
                                let (board, alight) = match direction {
                                    Direction::Forward => (board_position, alight_position),
                                    Direction::Backward => (alight_position, board_position),
                                };
                                let leg = SearchLeg {
                                    from: board_stop.location(),
                                    to: arrival.location,
                                    from_time: board_time,
                                    to_time: arrival.time,
                                    kind: LegKind::Transport {
                                        transport,
                                        day: trip.day,
                                        board_position: board,
                                        alight_position: alight,
                                    },
                                };
                                return Some((leg, predecessor));
                            }
                        }
                    }
                }
            }
        }
        None
    }

    // `transport` on the day that makes it leave the vehicle at `arrival`
    fn trip_arriving_at(
        &self,
        route: RouteIdx,
        transport: TransportIdx,
        position: usize,
        arrival: &Arrival,
    ) -> Option<Trip> {
        let minutes = self
            .timetable
            .event_time(route, transport, position, self.alight_event())
            .minutes();
        let since_midnight = i32::from(arrival.time.get()?) - i32::from(minutes);
        if since_midnight.rem_euclid(MINUTES_IN_DAY) != 0 {
            return None;
        }
        let day = self
            .base_day
            .checked_add(since_midnight.div_euclid(MINUTES_IN_DAY))?;
        if self.timetable.is_active(transport, day) {
            Some(Trip { transport, day })
        } else {
            None
        }
    }

    // Does a trip boarded at `board_step` at via level `from` reach level `to`
    // at `alight_step`, going through vias requiring no stay ?
    fn rides_through(
        &self,
        route: RouteIdx,
        board_step: usize,
        alight_step: usize,
        from: usize,
        to: usize,
    ) -> bool {
        let stops = self.timetable.stops_of(route);
        let mut level = from;
        for step in board_step + 1..alight_step {
            let location = stops[self.position(step, stops.len())].location();
            while level < to {
                match self.via_at(level, location) {
                    Some(via) if via.stay == PositiveDuration::zero() => level += 1,
                    _ => break,
                }
            }
        }
        level == to
    }

    // How to be ready at `location` with via level `level` in round `round`,
    // no later (in search order) than `deadline`.
    fn predecessor(
        &self,
        round: usize,
        location: LocationIdx,
        level: usize,
        deadline: DeltaTime,
    ) -> Option<Predecessor> {
        let direction = self.direction;
        let on_time = |ready: DeltaTime| direction.is_better_or_eq(ready, deadline);

        if round == 0 {
            let stay = self.via_stay(location, 0, level)?;
            for offset in &self.query.start {
                let seed_time = direction.add(self.start_delta, offset.duration);
                if offset.location == location && on_time(direction.add(seed_time, stay)) {
                    return Some(Predecessor::Seed {
                        offset: *offset,
                        walk: None,
                    });
                }
                for walk in self.walks_between(offset.location, location, seed_time) {
                    if on_time(direction.add(walk.end, stay)) {
                        return Some(Predecessor::Seed {
                            offset: *offset,
                            walk: Some(walk),
                        });
                    }
                }
            }
            return None;
        }

        let transfer_time = self.timetable.locations().transfer_time(location);
        for from_level in (0..=level).rev() {
            let time = self.state.round_end(round, location)[from_level];
            if !time.is_feasible() {
                continue;
            }
            if let Some(stay) = self.via_stay(location, from_level, level) {
                if on_time(direction.add(time, max(stay, transfer_time))) {
                    return Some(Predecessor::Vehicle {
                        arrival: Arrival {
                            location,
                            level: from_level,
                            time,
                        },
                        walk: None,
                    });
                }
            }
        }

        for origin in self.walk_origins(location) {
            for from_level in (0..=level).rev() {
                let time = self.state.round_end(round, origin)[from_level];
                if !time.is_feasible() {
                    continue;
                }
                for mid_level in from_level..=level {
                    let (origin_stay, stay) = match (
                        self.via_stay(origin, from_level, mid_level),
                        self.via_stay(location, mid_level, level),
                    ) {
                        (Some(origin_stay), Some(stay)) => (origin_stay, stay),
                        _ => continue,
                    };
                    let start = direction.add(time, origin_stay);
                    for walk in self.walks_between(origin, location, start) {
                        if on_time(direction.add(walk.end, stay)) {
                            return Some(Predecessor::Vehicle {
                                arrival: Arrival {
                                    location: origin,
                                    level: from_level,
                                    time,
                                },
                                walk: Some(walk),
                            });
                        }
                    }
                }
            }
        }
        None
    }

    // Locations from which `location` can be walked to, in search order.
    fn walk_origins(&self, location: LocationIdx) -> Vec<LocationIdx> {
        let mut origins: Vec<LocationIdx> = self
            .reverse_footpaths(location)
            .iter()
            .map(|footpath| footpath.target())
            .chain(
                self.reverse_td_footpaths(location)
                    .iter()
                    .map(|footpath| footpath.target),
            )
            .collect();
        origins.sort();
        origins.dedup();
        origins
    }

    // Walks from `from` to `to` starting at `start`, in search order.
    fn walks_between(&self, from: LocationIdx, to: LocationIdx, start: DeltaTime) -> Vec<Walk> {
        let direction = self.direction;
        let mut walks: Vec<Walk> = self
            .search_footpaths(from)
            .iter()
            .filter(|footpath| footpath.target() == to)
            .map(|footpath| Walk {
                from,
                to,
                start,
                end: direction.add(start, footpath.duration()),
            })
            .collect();
        let run = td_run(self.search_td_footpaths(from), to);
        if run.is_empty() {
            return walks;
        }
        let split = self
            .timetable
            .calendar()
            .to_instant(self.base_day, start)
            .and_then(|instant| td_duration_split(direction, run, instant));
        if let Some(split) = split {
            walks.push(Walk {
                from,
                to,
                start: direction.add(start, split.waiting_time),
                end: direction.add(start, split.total()),
            });
        }
        walks
    }

    // Checks the maximum stays of the vias, given in travel order.
    fn respects_max_stays(&self, journey: &Journey) -> bool {
        let vias = &self.query.via_stops;
        if vias.iter().all(|via| via.max_stay.is_none()) {
            return true;
        }
        let timetable = self.timetable;
        // (location, time spent there) in travel order
        let mut visits = Vec::new();
        for (idx, leg) in journey.legs.iter().enumerate() {
            if let LegKind::Transport {
                transport,
                board_position,
                alight_position,
                ..
            } = leg.kind
            {
                let stops = timetable.stops_of(timetable.route_of(transport));
                for stop in &stops[board_position + 1..alight_position] {
                    visits.push((stop.location(), PositiveDuration::zero()));
                }
            }
            if let Some(next) = journey.legs.get(idx + 1) {
                if next.from == leg.to {
                    let stay = next
                        .departure
                        .duration_since(&leg.arrival)
                        .unwrap_or_else(PositiveDuration::zero);
                    visits.push((leg.to, stay));
                }
            }
        }

        let mut vias = vias.iter().peekable();
        for (location, stay) in visits {
            let mut required = PositiveDuration::zero();
            while let Some(via) = vias.peek() {
                if via.location != location || stay < required + via.stay {
                    break;
                }
                if let Some(max_stay) = via.max_stay {
                    if stay > max_stay {
                        return false;
                    }
                }
                required = required + via.stay;
                vias.next();
            }
        }
        true
    }
}
