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

use super::{
    BitfieldIdx, Clasz, EventType, IdxRange, LocationIdx, Locations, RouteIdx, Stop, Timetable,
    TransportIdx,
};
use crate::footpath::{Footpath, TdFootpath};
use crate::time::{Bitfield, Calendar, DayIdx, MinutesAfterMidnight, UnixTime};
use chrono::NaiveDate;

impl Timetable {
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    pub fn nb_of_locations(&self) -> usize {
        self.locations.len()
    }

    pub fn nb_of_routes(&self) -> usize {
        self.route_location_seq.len()
    }

    pub fn nb_of_transports(&self) -> usize {
        self.transport_route.len()
    }

    pub fn routes(&self) -> impl Iterator<Item = RouteIdx> {
        (0..self.nb_of_routes()).map(RouteIdx::new)
    }

    pub fn stops_of(&self, route: RouteIdx) -> &[Stop] {
        &self.route_location_seq[route]
    }

    pub fn transports_of(&self, route: RouteIdx) -> IdxRange<TransportIdx> {
        self.route_transport_ranges[route.idx()]
    }

    pub fn route_of(&self, transport: TransportIdx) -> RouteIdx {
        self.transport_route[transport.idx()]
    }

    // position of the row of (stop_position, event_type) in the event table of a route
    fn event_row(nb_of_stops: usize, stop_position: usize, event_type: EventType) -> usize {
        debug_assert!(stop_position < nb_of_stops);
        match event_type {
            EventType::Departure => {
                debug_assert!(stop_position + 1 < nb_of_stops);
                stop_position * 2
            }
            EventType::Arrival => {
                debug_assert!(stop_position > 0);
                stop_position * 2 - 1
            }
        }
    }

    /// Times of `event_type` at `stop_position` for all transports of `route`,
    /// in transport order.
    ///
    /// There is no departure at the last stop and no arrival at the first one.
    pub fn event_times_at_stop(
        &self,
        route: RouteIdx,
        stop_position: usize,
        event_type: EventType,
    ) -> &[MinutesAfterMidnight] {
        let nb_of_transports = self.route_transport_ranges[route.idx()].len();
        let nb_of_stops = self.route_location_seq[route].len();
        let row = Self::event_row(nb_of_stops, stop_position, event_type);
        let from = self.route_stop_time_ranges[route.idx()].start + nb_of_transports * row;
        &self.route_stop_times[from..from + nb_of_transports]
    }

    /// Time of `event_type` of `transport` at `stop_position` of `route`.
    ///
    /// `transport` must belong to `route`, which is only checked in debug builds.
    pub fn event_time(
        &self,
        route: RouteIdx,
        transport: TransportIdx,
        stop_position: usize,
        event_type: EventType,
    ) -> MinutesAfterMidnight {
        let transports = self.route_transport_ranges[route.idx()];
        debug_assert!(transports.contains(&transport));
        let nb_of_stops = self.route_location_seq[route].len();
        let row = Self::event_row(nb_of_stops, stop_position, event_type);
        let idx = self.route_stop_time_ranges[route.idx()].start
            + transports.len() * row
            + transports.offset_of(&transport);
        self.route_stop_times[idx]
    }

    /// Instant of an event of `transport` running on `day`.
    pub fn event_instant(
        &self,
        transport: TransportIdx,
        day: DayIdx,
        stop_position: usize,
        event_type: EventType,
    ) -> UnixTime {
        let route = self.route_of(transport);
        let time = self.event_time(route, transport, stop_position, event_type);
        self.calendar.to_unixtime(day, time)
    }

    pub fn day_index(&self, instant: &UnixTime) -> Option<(DayIdx, MinutesAfterMidnight)> {
        self.calendar.day_idx_mam(instant)
    }

    pub fn instant_of(&self, day: DayIdx, minutes: MinutesAfterMidnight) -> UnixTime {
        self.calendar.to_unixtime(day, minutes)
    }

    pub fn bitfield(&self, bitfield: BitfieldIdx) -> &Bitfield {
        &self.bitfields[bitfield.idx()]
    }

    pub fn traffic_days(&self, transport: TransportIdx) -> &Bitfield {
        self.bitfield(self.transport_traffic_days[transport.idx()])
    }

    /// Does `transport` leave its first stop on `day` ?
    pub fn is_active(&self, transport: TransportIdx, day: DayIdx) -> bool {
        self.traffic_days(transport).contains(day)
    }

    pub fn transport_name(&self, transport: TransportIdx) -> &str {
        &self.transport_names[transport.idx()]
    }

    /// Number of days between the service date of `transport` and the day
    /// it leaves its first stop.
    pub fn initial_day_offset(&self, transport: TransportIdx) -> u8 {
        self.transport_initial_day_offset[transport.idx()]
    }

    /// The service date, as published in the feed, of `transport` running on `day`.
    pub fn service_date(&self, transport: TransportIdx, day: DayIdx) -> Option<NaiveDate> {
        let offset = i32::from(self.initial_day_offset(transport));
        let service_day = day.checked_add(-offset)?;
        Some(self.calendar.to_naive_date(&service_day))
    }

    /// The line of `transport` on the section starting at `stop_position`.
    pub fn line_of(&self, transport: TransportIdx, stop_position: usize) -> Option<&str> {
        let lines = self.transport_section_lines.get(transport)?;
        match lines.len() {
            0 => None,
            1 => Some(lines[0].as_str()),
            _ => lines.get(stop_position).map(|line| line.as_str()),
        }
    }

    pub fn route_clasz(&self, route: RouteIdx) -> Clasz {
        self.route_clasz[route.idx()]
    }

    pub fn section_clasz(&self, route: RouteIdx, stop_position: usize) -> Clasz {
        let sections = &self.route_section_clasz[route];
        if sections.len() == 1 {
            sections[0]
        } else {
            sections[stop_position]
        }
    }

    pub fn route_bikes_allowed_on_all_sections(&self, route: RouteIdx) -> bool {
        self.route_bikes_allowed.contains(2 * route.idx())
    }

    pub fn route_bikes_allowed_on_some_sections(&self, route: RouteIdx) -> bool {
        self.route_bikes_allowed.contains(2 * route.idx() + 1)
    }

    /// Can a bike be carried on the section starting at `stop_position` ?
    pub fn bikes_allowed(&self, route: RouteIdx, stop_position: usize) -> bool {
        if self.route_bikes_allowed_on_all_sections(route) {
            return true;
        }
        if !self.route_bikes_allowed_on_some_sections(route) {
            return false;
        }
        self.route_bikes_allowed_per_section
            .get(route)
            .and_then(|sections| sections.get(stop_position))
            .copied()
            .unwrap_or(false)
    }

    /// Routes stopping at `location`.
    pub fn routes_at(&self, location: LocationIdx) -> &[RouteIdx] {
        &self.location_routes[location]
    }

    pub fn footpaths_out(&self, location: LocationIdx) -> &[Footpath] {
        &self.footpaths_out[location]
    }

    /// Footpaths arriving at `location`, the target of each being its origin.
    pub fn footpaths_in(&self, location: LocationIdx) -> &[Footpath] {
        &self.footpaths_in[location]
    }

    pub fn td_footpaths_out(&self, location: LocationIdx) -> &[TdFootpath] {
        &self.td_footpaths_out[location]
    }

    /// Time-dependent footpaths arriving at `location`,
    /// the target of each being its origin.
    pub fn td_footpaths_in(&self, location: LocationIdx) -> &[TdFootpath] {
        &self.td_footpaths_in[location]
    }
}
