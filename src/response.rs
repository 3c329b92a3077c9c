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

use crate::time::{DayIdx, PositiveDuration, UnixTime};
use crate::transit_data::{LocationIdx, Timetable, TransportIdx};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegKind {
    /// access or egress between a location and the virtual start or end
    Offset { transport_mode_id: u8 },
    Transport {
        transport: TransportIdx,
        /// the day the transport leaves its first stop
        day: DayIdx,
        board_position: usize,
        alight_position: usize,
    },
    Footpath,
}

/// A part of a journey, in travel order : the traveller leaves `from`
/// at `departure` and reaches `to` at `arrival`.
///
/// For an offset, `from` and `to` are both the location at the
/// non-virtual end of the leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leg {
    pub from: LocationIdx,
    pub to: LocationIdx,
    pub departure: UnixTime,
    pub arrival: UnixTime,
    pub kind: LegKind,
}

impl Leg {
    pub fn transport(&self) -> Option<TransportIdx> {
        match self.kind {
            LegKind::Transport { transport, .. } => Some(transport),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journey {
    /// departure from the virtual start
    pub departure: UnixTime,
    /// arrival at the virtual destination
    pub arrival: UnixTime,
    pub nb_of_transfers: u8,
    pub legs: Vec<Leg>,
}

impl Journey {
    pub fn duration(&self) -> Option<PositiveDuration> {
        self.arrival.duration_since(&self.departure)
    }

    pub fn nb_of_transports(&self) -> usize {
        self.legs.iter().filter_map(Leg::transport).count()
    }

    /// Transports used, in travel order.
    pub fn transports(&self) -> impl Iterator<Item = TransportIdx> + '_ {
        self.legs.iter().filter_map(Leg::transport)
    }

    /// Is `self` at least as good as `other` on departure, arrival and
    /// transfers, and better on at least one of them ?
    pub fn dominates(&self, other: &Journey) -> bool {
        let at_least_as_good = self.departure >= other.departure
            && self.arrival <= other.arrival
            && self.nb_of_transfers <= other.nb_of_transfers;
        let better = self.departure > other.departure
            || self.arrival < other.arrival
            || self.nb_of_transfers < other.nb_of_transfers;
        at_least_as_good && better
    }

    pub fn print(&self, timetable: &Timetable) -> Result<String, std::fmt::Error> {
        let mut result = String::new();
        self.write(timetable, &mut result)?;
        Ok(result)
    }

    fn write_date(timetable: &Timetable, instant: &UnixTime) -> String {
        timetable.calendar().to_pretty_string(instant)
    }

    pub fn write<Writer: Write>(
        &self,
        timetable: &Timetable,
        writer: &mut Writer,
    ) -> Result<(), std::fmt::Error> {
        writeln!(writer, "*** New journey ***")?;
        writeln!(
            writer,
            "Departure : {}",
            Self::write_date(timetable, &self.departure)
        )?;
        writeln!(
            writer,
            "Arrival : {}",
            Self::write_date(timetable, &self.arrival)
        )?;
        writeln!(writer, "Nb of transfers : {}", self.nb_of_transfers)?;
        for leg in &self.legs {
            Self::write_leg(leg, timetable, writer)?;
        }
        Ok(())
    }

    fn write_leg<Writer: Write>(
        leg: &Leg,
        timetable: &Timetable,
        writer: &mut Writer,
    ) -> Result<(), std::fmt::Error> {
        let locations = timetable.locations();
        let from = locations.name(leg.from);
        let to = locations.name(leg.to);
        let departure = Self::write_date(timetable, &leg.departure);
        let arrival = Self::write_date(timetable, &leg.arrival);
        match leg.kind {
            LegKind::Offset { transport_mode_id } => writeln!(
                writer,
                "offset (mode {}) at {} from {} to {}",
                transport_mode_id, from, departure, arrival
            ),
            LegKind::Transport {
                transport,
                board_position,
                ..
            } => {
                let name = timetable.transport_name(transport);
                let line = timetable.line_of(transport, board_position).unwrap_or("-");
                writeln!(
                    writer,
                    "{} ({}) from {} at {} to {} at {}",
                    name, line, from, departure, to, arrival
                )
            }
            LegKind::Footpath => writeln!(
                writer,
                "walk from {} at {} to {} at {}",
                from, departure, to, arrival
            ),
        }
    }
}
