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

use std::ops::Range;

use fixedbitset::FixedBitSet;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{
    vecvec::VecVec, BitfieldIdx, Clasz, EventType, IdxRange, Location, LocationIdx, Locations,
    RouteIdx, Stop, Timetable, TransportIdx,
};
use crate::footpath::{Footpath, TdFootpath};
use crate::time::bitfield::Bitfields;
use crate::time::{
    Bitfield, Calendar, MinutesAfterMidnight, PositiveDuration, UnixTime,
    MAX_DAYS_IN_TRIP, MAX_MINUTES_AFTER_MIDNIGHT, MINUTES_IN_DAY,
};

/// Arrival and departure of a transport at a stop.
///
/// The arrival at the first stop and the departure at the last stop are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTime {
    pub arrival: MinutesAfterMidnight,
    pub departure: MinutesAfterMidnight,
}

impl StopTime {
    pub fn new(arrival: MinutesAfterMidnight, departure: MinutesAfterMidnight) -> Self {
        Self { arrival, departure }
    }
}

#[derive(Debug, Clone)]
pub struct TransportDescription {
    pub name: String,
    /// days on which the transport leaves its first stop,
    /// before normalization of times past midnight
    pub bitfield: BitfieldIdx,
    /// one stop time per stop of the route
    pub stop_times: Vec<StopTime>,
    /// none, one for the whole transport, or one per section
    pub section_lines: Vec<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimetableError {
    #[error("A route must have at least 2 stops, got {nb_of_stops}")]
    TooFewStops { nb_of_stops: usize },
    #[error("Unknown location {location}")]
    UnknownLocation { location: LocationIdx },
    #[error("A route with {nb_of_sections} section(s) was given {nb_of_values} {what}")]
    SectionMismatch {
        what: &'static str,
        nb_of_sections: usize,
        nb_of_values: usize,
    },
    #[error("Cannot register a new route while {route} is not finished")]
    RouteNotFinished { route: RouteIdx },
    #[error("No route is open")]
    NoOpenRoute,
    #[error("Transport {name} is added to {route} which is not the open route")]
    TransportOutsideOpenRoute { name: String, route: RouteIdx },
    #[error(
        "Transport {name} has {nb_of_stop_times} stop times for a route with {nb_of_stops} stops"
    )]
    StopTimesMismatch {
        name: String,
        nb_of_stop_times: usize,
        nb_of_stops: usize,
    },
    #[error("Transport {name} uses an unknown {bitfield}")]
    UnknownBitfield { name: String, bitfield: BitfieldIdx },
    #[error("Transport {name} has decreasing times at stop position {stop_position}")]
    NonMonotonicTimes { name: String, stop_position: usize },
    #[error(
        "Transport {name} has an event at stop position {stop_position} more than {} days \
         after its first departure",
        MAX_DAYS_IN_TRIP
    )]
    EventBeyondDaySpan { name: String, stop_position: usize },
    #[error("Transport {name} runs on no day of the calendar")]
    NoTrafficDay { name: String },
    #[error("{route} has no transport")]
    EmptyRoute { route: RouteIdx },
    #[error("Transports of {route} overtake each other at event {event_position}")]
    OvertakingTransports {
        route: RouteIdx,
        event_position: usize,
    },
    #[error("{route} is not finished")]
    UnfinishedRoute { route: RouteIdx },
    #[error("Location {location} has an unknown parent {parent}")]
    DanglingParent {
        location: LocationIdx,
        parent: LocationIdx,
    },
    #[error("A bitfield of {capacity} days does not match the {nb_of_days} days of the calendar")]
    BitfieldCapacity { capacity: usize, nb_of_days: usize },
}

struct OpenRoute {
    route: RouteIdx,
    first_transport: TransportIdx,
    // stop times of each transport of the route, normalized
    stop_times: Vec<Vec<StopTime>>,
}

/// Write-once construction of a `Timetable`.
///
/// Routes are registered one at a time : `register_route`, then
/// `add_transport` for each of its transports, then `finish_route`.
/// Transports of a route must be added in the order of their departures.
pub struct TimetableBuilder {
    calendar: Calendar,
    locations: Locations,
    bitfields: Bitfields,

    route_location_seq: VecVec<RouteIdx, Stop>,
    route_section_clasz: VecVec<RouteIdx, Clasz>,
    route_clasz: Vec<Clasz>,
    route_bikes_allowed: Vec<(bool, bool)>,
    route_bikes_allowed_per_section: Vec<(RouteIdx, bool)>,
    route_transport_ranges: Vec<IdxRange<TransportIdx>>,
    route_stop_time_ranges: Vec<Range<usize>>,
    route_stop_times: Vec<MinutesAfterMidnight>,
    open_route: Option<OpenRoute>,
    // first error raised while closing a route, returned by `build()`
    route_error: Option<TimetableError>,

    transport_route: Vec<RouteIdx>,
    transport_traffic_days: Vec<BitfieldIdx>,
    transport_initial_day_offset: Vec<u8>,
    transport_names: Vec<String>,
    transport_section_lines: VecVec<TransportIdx, String>,

    footpaths: Vec<(LocationIdx, Footpath)>,
    td_footpaths: Vec<(LocationIdx, TdFootpath)>,
}

impl TimetableBuilder {
    pub fn new(calendar: Calendar) -> Self {
        Self {
            calendar,
            locations: Locations::default(),
            bitfields: Bitfields::new(),
            route_location_seq: VecVec::new(),
            route_section_clasz: VecVec::new(),
            route_clasz: Vec::new(),
            route_bikes_allowed: Vec::new(),
            route_bikes_allowed_per_section: Vec::new(),
            route_transport_ranges: Vec::new(),
            route_stop_time_ranges: Vec::new(),
            route_stop_times: Vec::new(),
            open_route: None,
            route_error: None,
            transport_route: Vec::new(),
            transport_traffic_days: Vec::new(),
            transport_initial_day_offset: Vec::new(),
            transport_names: Vec::new(),
            transport_section_lines: VecVec::new(),
            footpaths: Vec::new(),
            td_footpaths: Vec::new(),
        }
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    /// Registers a location. If a location with the same id was already
    /// registered, it is kept and its index is returned.
    pub fn register_location(&mut self, location: Location) -> LocationIdx {
        let id = location.id.clone();
        match self.locations.register(location) {
            Ok(idx) => idx,
            Err(existing) => {
                warn!(
                    "Location {} is registered twice. I'll keep the first one {}.",
                    id, existing
                );
                existing
            }
        }
    }

    pub fn register_bitfield(&mut self, bitfield: Bitfield) -> Result<BitfieldIdx, TimetableError> {
        let nb_of_days = usize::from(self.calendar.nb_of_days());
        if bitfield.capacity() != nb_of_days {
            return Err(TimetableError::BitfieldCapacity {
                capacity: bitfield.capacity(),
                nb_of_days,
            });
        }
        Ok(self.bitfields.get_or_insert(bitfield))
    }

    fn check_location(&self, location: LocationIdx) -> Result<(), TimetableError> {
        if location.idx() < self.locations.len() {
            Ok(())
        } else {
            Err(TimetableError::UnknownLocation { location })
        }
    }

    /// Opens a new route.
    ///
    /// `clasz_sections` and `bikes_allowed_per_section` hold either one value
    /// for the whole route, or one value per section.
    pub fn register_route(
        &mut self,
        stops: Vec<Stop>,
        clasz_sections: Vec<Clasz>,
        bikes_allowed_per_section: Vec<bool>,
    ) -> Result<RouteIdx, TimetableError> {
        if let Some(open_route) = &self.open_route {
            return Err(TimetableError::RouteNotFinished {
                route: open_route.route,
            });
        }
        if stops.len() < 2 {
            return Err(TimetableError::TooFewStops {
                nb_of_stops: stops.len(),
            });
        }
        for stop in &stops {
            self.check_location(stop.location())?;
        }
        let nb_of_sections = stops.len() - 1;
        let check_sections = |what: &'static str, nb_of_values: usize| {
            if nb_of_values == 1 || nb_of_values == nb_of_sections {
                Ok(())
            } else {
                Err(TimetableError::SectionMismatch {
                    what,
                    nb_of_sections,
                    nb_of_values,
                })
            }
        };
        check_sections("classes", clasz_sections.len())?;
        check_sections("bike permissions", bikes_allowed_per_section.len())?;

        let route = self.route_location_seq.push(stops);
        self.route_clasz.push(clasz_sections[0]);
        self.route_section_clasz.push(clasz_sections);

        let all_allowed = bikes_allowed_per_section.iter().all(|allowed| *allowed);
        let some_allowed = bikes_allowed_per_section.iter().any(|allowed| *allowed);
        self.route_bikes_allowed.push((all_allowed, some_allowed));
        if some_allowed && !all_allowed {
            self.route_bikes_allowed_per_section
                .extend(bikes_allowed_per_section.into_iter().map(|allowed| (route, allowed)));
        }

        let next_transport = TransportIdx::new(self.transport_route.len());
        self.route_transport_ranges
            .push(IdxRange::new(next_transport, next_transport));
        self.open_route = Some(OpenRoute {
            route,
            first_transport: next_transport,
            stop_times: Vec::new(),
        });
        Ok(route)
    }

    /// Adds a transport to the open `route`.
    ///
    /// Times past midnight of the first departure are normalized : if the
    /// transport leaves its first stop `n` days after the midnight its times
    /// refer to, its times are moved `n` days earlier, its traffic days `n`
    /// days later, and `n` is kept as its initial day offset.
    pub fn add_transport(
        &mut self,
        route: RouteIdx,
        transport: TransportDescription,
    ) -> Result<TransportIdx, TimetableError> {
        let TransportDescription {
            name,
            bitfield,
            mut stop_times,
            section_lines,
        } = transport;
        match &self.open_route {
            Some(open_route) if open_route.route == route => (),
            _ => return Err(TimetableError::TransportOutsideOpenRoute { name, route }),
        }
        let nb_of_stops = self.route_location_seq[route].len();
        if stop_times.len() != nb_of_stops {
            return Err(TimetableError::StopTimesMismatch {
                name,
                nb_of_stop_times: stop_times.len(),
                nb_of_stops,
            });
        }
        let nb_of_sections = nb_of_stops - 1;
        if !(section_lines.len() <= 1 || section_lines.len() == nb_of_sections) {
            return Err(TimetableError::SectionMismatch {
                what: "line names",
                nb_of_sections,
                nb_of_values: section_lines.len(),
            });
        }
        let bitfield_data = match self.bitfields.get(bitfield) {
            Some(data) => data,
            None => return Err(TimetableError::UnknownBitfield { name, bitfield }),
        };

        // the first arrival and the last departure are not part of the schedule
        stop_times[0].arrival = stop_times[0].departure;
        stop_times[nb_of_sections].departure = stop_times[nb_of_sections].arrival;
        for (position, stop_time) in stop_times.iter().enumerate() {
            let next_is_earlier = stop_times
                .get(position + 1)
                .map_or(false, |next| next.arrival < stop_time.departure);
            if stop_time.departure < stop_time.arrival || next_is_earlier {
                return Err(TimetableError::NonMonotonicTimes {
                    name,
                    stop_position: position,
                });
            }
        }

        let day_offset = stop_times[0].departure.days();
        let traffic_days = if day_offset > 0 {
            let shift = day_offset * (MINUTES_IN_DAY as u16);
            for stop_time in stop_times.iter_mut() {
                stop_time.arrival.minutes -= shift;
                stop_time.departure.minutes -= shift;
            }
            let shifted = bitfield_data.shifted(day_offset);
            if shifted.is_empty() {
                return Err(TimetableError::NoTrafficDay { name });
            }
            self.bitfields.get_or_insert(shifted)
        } else {
            if bitfield_data.is_empty() {
                return Err(TimetableError::NoTrafficDay { name });
            }
            bitfield
        };
        let beyond_day_span = stop_times
            .iter()
            .position(|stop_time| stop_time.departure.minutes >= MAX_MINUTES_AFTER_MIDNIGHT);
        if let Some(stop_position) = beyond_day_span {
            return Err(TimetableError::EventBeyondDaySpan {
                name,
                stop_position,
            });
        }

        let idx = TransportIdx::new(self.transport_route.len());
        self.transport_route.push(route);
        self.transport_traffic_days.push(traffic_days);
        // a u16 of minutes holds less than 46 days
        self.transport_initial_day_offset.push(day_offset as u8);
        self.transport_names.push(name);
        self.transport_section_lines.push(section_lines);
        if let Some(open_route) = self.open_route.as_mut() {
            open_route.stop_times.push(stop_times);
        }
        Ok(idx)
    }

    /// Closes the transport range of the open route and lays out its event times.
    ///
    /// On error the route stays open and nothing is laid out, so the
    /// timetable can no longer be built.
    pub fn finish_route(&mut self) -> Result<(), TimetableError> {
        let open_route = self.open_route.as_ref().ok_or(TimetableError::NoOpenRoute)?;
        let route = open_route.route;
        let event_rows = if open_route.stop_times.is_empty() {
            Err(TimetableError::EmptyRoute { route })
        } else {
            event_rows(route, &open_route.stop_times)
        };
        let event_rows = match event_rows {
            Ok(rows) => rows,
            Err(err) => {
                if self.route_error.is_none() {
                    self.route_error = Some(err.clone());
                }
                return Err(err);
            }
        };
        let first_transport = open_route.first_transport;
        let nb_of_transports = open_route.stop_times.len();
        self.open_route = None;

        let first_time = self.route_stop_times.len();
        self.route_stop_times.extend(event_rows);
        let last_transport = TransportIdx::new(self.transport_route.len());
        self.route_transport_ranges[route.idx()] = IdxRange::new(first_transport, last_transport);
        self.route_stop_time_ranges
            .push(first_time..self.route_stop_times.len());
        debug!("{} finished with {} transports", route, nb_of_transports);
        Ok(())
    }

    pub fn add_footpath(
        &mut self,
        from: LocationIdx,
        to: LocationIdx,
        duration: PositiveDuration,
    ) -> Result<(), TimetableError> {
        self.check_location(from)?;
        self.check_location(to)?;
        self.footpaths.push((from, Footpath::new(to, duration)));
        Ok(())
    }

    /// Adds a footpath from `from` to `to`, valid from `valid_from` until the
    /// next footpath between the same locations becomes valid.
    /// A duration of `PositiveDuration::MAX` withdraws the footpath.
    pub fn add_td_footpath(
        &mut self,
        from: LocationIdx,
        to: LocationIdx,
        valid_from: UnixTime,
        duration: PositiveDuration,
    ) -> Result<(), TimetableError> {
        self.check_location(from)?;
        self.check_location(to)?;
        self.td_footpaths.push((
            from,
            TdFootpath {
                target: to,
                valid_from,
                duration,
            },
        ));
        Ok(())
    }

    /// Freezes the timetable.
    pub fn build(mut self) -> Result<Timetable, TimetableError> {
        if let Some(err) = self.route_error.take() {
            return Err(err);
        }
        if let Some(open_route) = &self.open_route {
            return Err(TimetableError::UnfinishedRoute {
                route: open_route.route,
            });
        }
        if let Some((location, parent)) = self.locations.dangling_parent() {
            return Err(TimetableError::DanglingParent { location, parent });
        }
        self.locations.compute_children();

        let nb_of_locations = self.locations.len();
        let nb_of_routes = self.route_location_seq.len();

        let mut location_routes = Vec::new();
        for (route, stops) in self.route_location_seq.iter() {
            let mut visited: Vec<LocationIdx> = Vec::with_capacity(stops.len());
            for stop in stops {
                if !visited.contains(&stop.location()) {
                    visited.push(stop.location());
                    location_routes.push((stop.location(), route));
                }
            }
        }
        let location_routes = VecVec::from_keyed(nb_of_locations, location_routes);

        let mut footpaths = self.footpaths;
        footpaths.sort_by_key(|(from, footpath)| (*from, footpath.target()));
        let footpaths_in = {
            let mut incoming: Vec<_> = footpaths
                .iter()
                .map(|(from, footpath)| {
                    (footpath.target(), Footpath::new(*from, footpath.duration()))
                })
                .collect();
            incoming.sort_by_key(|(to, footpath)| (*to, footpath.target()));
            VecVec::from_keyed(nb_of_locations, incoming)
        };
        let footpaths_out = VecVec::from_keyed(nb_of_locations, footpaths);

        let mut td_footpaths = self.td_footpaths;
        td_footpaths.sort_by_key(|(from, footpath)| (*from, footpath.target, footpath.valid_from));
        let td_footpaths_in = {
            let mut incoming: Vec<_> = td_footpaths
                .iter()
                .map(|(from, footpath)| {
                    (
                        footpath.target,
                        TdFootpath {
                            target: *from,
                            ..*footpath
                        },
                    )
                })
                .collect();
            incoming.sort_by_key(|(to, footpath)| (*to, footpath.target, footpath.valid_from));
            VecVec::from_keyed(nb_of_locations, incoming)
        };
        let td_footpaths_out = VecVec::from_keyed(nb_of_locations, td_footpaths);

        let mut route_bikes_allowed = FixedBitSet::with_capacity(2 * nb_of_routes);
        for (route, (all_allowed, some_allowed)) in self.route_bikes_allowed.iter().enumerate() {
            route_bikes_allowed.set(2 * route, *all_allowed);
            route_bikes_allowed.set(2 * route + 1, *some_allowed);
        }
        let route_bikes_allowed_per_section =
            VecVec::from_keyed(nb_of_routes, self.route_bikes_allowed_per_section);

        info!(
            "Timetable built with {} locations, {} routes, {} transports and {} bitfields",
            nb_of_locations,
            nb_of_routes,
            self.transport_route.len(),
            self.bitfields.len()
        );

        Ok(Timetable {
            calendar: self.calendar,
            locations: self.locations,
            bitfields: self.bitfields.into_vec(),
            route_location_seq: self.route_location_seq,
            route_section_clasz: self.route_section_clasz,
            route_clasz: self.route_clasz,
            route_bikes_allowed,
            route_bikes_allowed_per_section,
            route_transport_ranges: self.route_transport_ranges,
            route_stop_time_ranges: self.route_stop_time_ranges,
            route_stop_times: self.route_stop_times,
            transport_route: self.transport_route,
            transport_traffic_days: self.transport_traffic_days,
            transport_initial_day_offset: self.transport_initial_day_offset,
            transport_names: self.transport_names,
            transport_section_lines: self.transport_section_lines,
            location_routes,
            footpaths_out,
            footpaths_in,
            td_footpaths_out,
            td_footpaths_in,
        })
    }
}

/// Event rows of a route : stop 0 departure, stop 1 arrival, stop 1
/// departure, ..., last stop arrival, each row holding one time per
/// transport in transport order.
fn event_rows(
    route: RouteIdx,
    stop_times: &[Vec<StopTime>],
) -> Result<Vec<MinutesAfterMidnight>, TimetableError> {
    let nb_of_stops = stop_times.first().map_or(0, Vec::len);
    let events = (0..nb_of_stops).flat_map(move |stop_position| {
        let arrival = (stop_position != 0).then(|| (stop_position, EventType::Arrival));
        let departure =
            (stop_position + 1 != nb_of_stops).then(|| (stop_position, EventType::Departure));
        arrival.into_iter().chain(departure)
    });
    let mut rows = Vec::with_capacity(stop_times.len() * 2 * nb_of_stops.saturating_sub(1));
    for (event_position, (stop_position, event_type)) in events.enumerate() {
        let row_start = rows.len();
        rows.extend(stop_times.iter().map(|times| match event_type {
            EventType::Arrival => times[stop_position].arrival,
            EventType::Departure => times[stop_position].departure,
        }));
        if rows[row_start..].windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(TimetableError::OvertakingTransports {
                route,
                event_position,
            });
        }
    }
    Ok(rows)
}
