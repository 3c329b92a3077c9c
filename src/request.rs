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

use crate::engine::state::{MAX_TRANSFERS, MAX_VIAS};
use crate::time::{Direction, PositiveDuration, UnixTime};
use crate::transit_data::{ClaszMask, LocationIdx, Timetable};
use tracing::warn;

/// Access or egress leg between a location and the virtual start or end
/// of the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    pub location: LocationIdx,
    pub duration: PositiveDuration,
    /// opaque tag given back in the journeys
    pub transport_mode_id: u8,
}

impl Offset {
    pub fn new(location: LocationIdx, duration: PositiveDuration) -> Self {
        Self {
            location,
            duration,
            transport_mode_id: 0,
        }
    }
}

/// A location a journey must go through, staying there at least `stay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViaStop {
    pub location: LocationIdx,
    pub stay: PositiveDuration,
    pub max_stay: Option<PositiveDuration>,
}

impl ViaStop {
    pub fn new(location: LocationIdx, stay: PositiveDuration) -> Self {
        Self {
            location,
            stay,
            max_stay: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartTime {
    Instant(UnixTime),
    /// every instant in `[from, to]`
    Interval { from: UnixTime, to: UnixTime },
}

/// A journey query.
///
/// The search begins at the `start` locations and ends at the
/// `destination` ones :
/// - in a `Direction::Forward` search, `start` are the places the traveller
///   departs from, and the query time is a departure time,
/// - in a `Direction::Backward` search, `start` are the places the traveller
///   wants to reach, and the query time is an arrival time.
///
/// `via_stops` are always given in travel order.
#[derive(Debug, Clone)]
pub struct Query {
    pub start_time: StartTime,
    pub direction: Direction,
    pub start: Vec<Offset>,
    pub destination: Vec<Offset>,
    pub via_stops: Vec<ViaStop>,
    pub allowed_classes: ClaszMask,
    pub require_bike_transport: bool,
    pub max_transfers: u8,
}

impl Query {
    pub fn new(start_time: StartTime, direction: Direction) -> Self {
        Self {
            start_time,
            direction,
            start: Vec::new(),
            destination: Vec::new(),
            via_stops: Vec::new(),
            allowed_classes: ClaszMask::all(),
            require_bike_transport: false,
            max_transfers: MAX_TRANSFERS,
        }
    }

    pub fn nb_of_vias(&self) -> usize {
        self.via_stops.len()
    }

    /// Checks the query against `timetable`, for a search state
    /// compiled for `nb_of_vias` via stops.
    pub fn validate(&self, timetable: &Timetable, nb_of_vias: usize) -> Result<(), BadRequest> {
        if self.start.is_empty() {
            return Err(BadRequest::NoStart);
        }
        if self.destination.is_empty() {
            return Err(BadRequest::NoDestination);
        }
        let nb_of_locations = timetable.nb_of_locations();
        let locations = self
            .start
            .iter()
            .chain(self.destination.iter())
            .map(|offset| offset.location)
            .chain(self.via_stops.iter().map(|via| via.location));
        for location in locations {
            if location.idx() >= nb_of_locations {
                return Err(BadRequest::UnknownLocation(location));
            }
        }
        if self.via_stops.len() > MAX_VIAS {
            return Err(BadRequest::TooManyVias(self.via_stops.len()));
        }
        if self.via_stops.len() != nb_of_vias {
            return Err(BadRequest::ViaCountMismatch {
                expected: nb_of_vias,
                got: self.via_stops.len(),
            });
        }
        for via in &self.via_stops {
            if let Some(max_stay) = via.max_stay {
                if max_stay < via.stay {
                    return Err(BadRequest::MaxStayBelowStay(via.location));
                }
            }
        }
        if self.max_transfers > MAX_TRANSFERS {
            return Err(BadRequest::TooManyTransfers(self.max_transfers));
        }

        let calendar = timetable.calendar();
        let check_instant = |instant: UnixTime| {
            if calendar.contains(&instant) {
                Ok(())
            } else {
                let (first, last) = calendar.internal_interval();
                warn!(
                    "The requested instant {} is out of the validity period of the data. \
                     Allowed instants are between {} and {}.",
                    instant, first, last
                );
                Err(BadRequest::StartTimeOutOfRange(instant))
            }
        };
        match self.start_time {
            StartTime::Instant(instant) => check_instant(instant)?,
            StartTime::Interval { from, to } => {
                if to < from {
                    return Err(BadRequest::InvertedInterval { from, to });
                }
                check_instant(from)?;
                check_instant(to)?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BadRequest {
    #[error("No valid start location among the provided ones.")]
    NoStart,
    #[error("No valid destination location among the provided ones.")]
    NoDestination,
    #[error("Location {0} does not belong to the timetable.")]
    UnknownLocation(LocationIdx),
    #[error("{0} via stops requested, at most {} are supported.", MAX_VIAS)]
    TooManyVias(usize),
    #[error("The search state handles {expected} via stops, but the query has {got}.")]
    ViaCountMismatch { expected: usize, got: usize },
    #[error("The maximum stay at via {0} is smaller than its minimum stay.")]
    MaxStayBelowStay(LocationIdx),
    #[error("{0} transfers requested, at most {} are supported.", MAX_TRANSFERS)]
    TooManyTransfers(u8),
    #[error("The requested instant {0} is out of the validity period of the data.")]
    StartTimeOutOfRange(UnixTime),
    #[error("The requested interval [{from}, {to}] ends before it begins.")]
    InvertedInterval { from: UnixTime, to: UnixTime },
    #[error("The search state has not been sized for this timetable.")]
    StateNotSized,
}
