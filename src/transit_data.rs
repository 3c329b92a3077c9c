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

pub mod builder;
pub mod clasz;
pub mod idx;
pub mod location;
mod queries;
pub mod vecvec;

pub use builder::{StopTime, TimetableBuilder, TimetableError, TransportDescription};
pub use clasz::{Clasz, ClaszMask};
pub use idx::{BitfieldIdx, IdxRange, LocationIdx, RouteIdx, SourceIdx, TransportIdx};
pub use location::{Coordinates, Location, LocationId, LocationType, Locations};

use crate::footpath::{Footpath, TdFootpath};
use crate::time::{Bitfield, Calendar, Direction, MinutesAfterMidnight};
use fixedbitset::FixedBitSet;
use std::ops::Range;
use vecvec::VecVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Arrival,
    Departure,
}

/// A stop of a route : a location, and whether passengers may
/// board (`in_allowed`) or alight (`out_allowed`) there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stop {
    location: LocationIdx,
    in_allowed: bool,
    out_allowed: bool,
}

impl Stop {
    pub fn new(location: LocationIdx, in_allowed: bool, out_allowed: bool) -> Self {
        Self {
            location,
            in_allowed,
            out_allowed,
        }
    }

    pub fn location(&self) -> LocationIdx {
        self.location
    }

    pub fn in_allowed(&self) -> bool {
        self.in_allowed
    }

    pub fn out_allowed(&self) -> bool {
        self.out_allowed
    }

    /// Can a vehicle leg of a search going in `direction` begin here ?
    pub fn can_start(&self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => self.in_allowed,
            Direction::Backward => self.out_allowed,
        }
    }

    /// Can a vehicle leg of a search going in `direction` end here ?
    pub fn can_finish(&self, direction: Direction) -> bool {
        match direction {
            Direction::Forward => self.out_allowed,
            Direction::Backward => self.in_allowed,
        }
    }
}

/// Read-only timetable, obtained from `TimetableBuilder::build()`.
///
/// All entities are addressed by dense indices :
/// - locations by `LocationIdx`,
/// - routes by `RouteIdx`,
/// - transports by `TransportIdx`, the transports of a route having
///   consecutive indices,
/// - traffic days by `BitfieldIdx`.
///
/// For each route, event times are stored in a flat table, one row per
/// event of the stop sequence (departure at stop 0, arrival at stop 1,
/// departure at stop 1, ..., arrival at the last stop) and one column
/// per transport of the route. A row is contiguous in memory.
#[derive(Debug)]
pub struct Timetable {
    pub(crate) calendar: Calendar,
    pub(crate) locations: Locations,
    pub(crate) bitfields: Vec<Bitfield>,

    pub(crate) route_location_seq: VecVec<RouteIdx, Stop>,
    pub(crate) route_section_clasz: VecVec<RouteIdx, Clasz>,
    pub(crate) route_clasz: Vec<Clasz>,
    // two bits per route : bikes allowed on all sections, on some sections
    pub(crate) route_bikes_allowed: FixedBitSet,
    // only filled for routes allowing bikes on some sections
    pub(crate) route_bikes_allowed_per_section: VecVec<RouteIdx, bool>,
    pub(crate) route_transport_ranges: Vec<IdxRange<TransportIdx>>,
    pub(crate) route_stop_time_ranges: Vec<Range<usize>>,
    pub(crate) route_stop_times: Vec<MinutesAfterMidnight>,

    pub(crate) transport_route: Vec<RouteIdx>,
    pub(crate) transport_traffic_days: Vec<BitfieldIdx>,
    pub(crate) transport_initial_day_offset: Vec<u8>,
    pub(crate) transport_names: Vec<String>,
    // a single line for a transport applies to all its sections
    pub(crate) transport_section_lines: VecVec<TransportIdx, String>,

    pub(crate) location_routes: VecVec<LocationIdx, RouteIdx>,
    pub(crate) footpaths_out: VecVec<LocationIdx, Footpath>,
    pub(crate) footpaths_in: VecVec<LocationIdx, Footpath>,
    pub(crate) td_footpaths_out: VecVec<LocationIdx, TdFootpath>,
    pub(crate) td_footpaths_in: VecVec<LocationIdx, TdFootpath>,
}
