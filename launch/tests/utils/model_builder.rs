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

use std::collections::HashMap;

use launch::config::launch_params::default_transfer_duration;
use launch::transit_raptor::time::{Bitfield, MinutesAfterMidnight};
use launch::transit_raptor::transit_data::{
    Clasz, Location, LocationId, SourceIdx, Stop, StopTime, TransportDescription,
};
use launch::transit_raptor::{
    Calendar, NaiveDate, NaiveDateTime, PositiveDuration, Timetable, TimetableBuilder,
    TimetableError, UnixTime,
};

const DEFAULT_CALENDAR_ID: &str = "default_service";

/// Builder used to easily create a `Timetable`.
/// Note: if not explicitly set, all the vehicle journeys
/// run on every day of the validity period, which defaults to 2020-01-01.
///
/// Vehicle journeys with the same stops, classes and bike permissions
/// are gathered in routes, in the order of their departures. A vehicle
/// journey that would overtake another one is put in a new route.
pub struct ModelBuilder {
    first_date: NaiveDate,
    last_date: NaiveDate,
    calendars: HashMap<String, Vec<NaiveDate>>,
    stops: Vec<StopInfo>,
    vehicle_journeys: Vec<VehicleJourney>,
    footpaths: Vec<(String, String, PositiveDuration)>,
    td_footpaths: Vec<(String, String, NaiveDateTime, PositiveDuration)>,
    default_transfer_duration: PositiveDuration,
}

struct StopInfo {
    name: String,
    transfer_duration: Option<PositiveDuration>,
}

struct VehicleJourney {
    name: String,
    calendar: String,
    clasz: Clasz,
    bikes_allowed: bool,
    line: Option<String>,
    stop_times: Vec<VjStopTime>,
}

struct VjStopTime {
    stop: String,
    arrival: MinutesAfterMidnight,
    departure: MinutesAfterMidnight,
    pickup_allowed: bool,
    drop_off_allowed: bool,
}

/// Builder used to create a new vehicle journey.
pub struct VehicleJourneyBuilder<'a> {
    model: &'a mut ModelBuilder,
    vj_idx: usize,
}

// stops, clasz and bike permission shared by the vehicle journeys of a route
type RouteKey = (Vec<(String, bool, bool)>, Clasz, bool);

impl Default for ModelBuilder {
    fn default() -> Self {
        let date = "2020-01-01";
        Self::new(date, date)
    }
}

impl ModelBuilder {
    pub fn new(first_date: impl AsDate, last_date: impl AsDate) -> Self {
        let first_date = first_date.as_date();
        let last_date = last_date.as_date();
        assert!(first_date <= last_date);
        let dates: Vec<_> = first_date
            .iter_days()
            .take_while(|date| *date <= last_date)
            .collect();
        let model_builder = Self {
            first_date,
            last_date,
            calendars: HashMap::new(),
            stops: Vec::new(),
            vehicle_journeys: Vec::new(),
            footpaths: Vec::new(),
            td_footpaths: Vec::new(),
            default_transfer_duration: default_transfer_duration(),
        };
        model_builder.calendar(DEFAULT_CALENDAR_ID, &dates)
    }

    /// Add a new vehicle journey
    ///
    /// ```ignore
    /// let timetable = ModelBuilder::default()
    ///        .vj("toto", |vj_builder| {
    ///            vj_builder
    ///                .st("A", "10:00:00", "10:00:00")
    ///                .st("B", "11:00:00", "11:00:00");
    ///        })
    ///        .build()?;
    /// ```
    pub fn vj<F>(mut self, name: &str, mut vj_initer: F) -> Self
    where
        F: FnMut(VehicleJourneyBuilder),
    {
        assert!(
            self.vehicle_journeys.iter().all(|vj| vj.name != name),
            "vj {} already exists",
            name
        );
        self.vehicle_journeys.push(VehicleJourney {
            name: name.to_string(),
            calendar: DEFAULT_CALENDAR_ID.to_string(),
            clasz: Clasz::Bus,
            bikes_allowed: false,
            line: None,
            stop_times: Vec::new(),
        });
        let vj_idx = self.vehicle_journeys.len() - 1;
        let vj_builder = VehicleJourneyBuilder {
            model: &mut self,
            vj_idx,
        };
        vj_initer(vj_builder);
        self
    }

    /// Add a new calendar, or add dates to an existing one
    pub fn calendar(mut self, id: &str, dates: &[impl AsDate]) -> Self {
        self.calendars
            .entry(id.to_string())
            .or_default()
            .extend(dates.iter().map(AsDate::as_date));
        self
    }

    /// Change the default calendar.
    /// If not explicitly set, all vehicle journeys are linked to it.
    pub fn default_calendar(mut self, dates: &[impl AsDate]) -> Self {
        self.calendars.remove(DEFAULT_CALENDAR_ID);
        self.calendar(DEFAULT_CALENDAR_ID, dates)
    }

    /// Declare a stop, with no vehicle journey if none uses it
    pub fn stop(mut self, name: &str) -> Self {
        self.stop_mut(name);
        self
    }

    /// The time needed to change vehicles at `stop`
    pub fn transfer_duration(mut self, stop: &str, duration: impl IntoDuration) -> Self {
        let duration = duration.into_duration();
        self.stop_mut(stop).transfer_duration = Some(duration);
        self
    }

    /// The time needed to change vehicles at stops without
    /// an explicit transfer duration
    pub fn default_transfer_duration(mut self, duration: impl IntoDuration) -> Self {
        self.default_transfer_duration = duration.into_duration();
        self
    }

    pub fn add_transfer(mut self, from: &str, to: &str, duration: impl IntoDuration) -> Self {
        self.stop_mut(from);
        self.stop_mut(to);
        self.footpaths
            .push((from.to_string(), to.to_string(), duration.into_duration()));
        self
    }

    /// A footpath from `from` to `to` available from `valid_from`
    /// (UTC, "20200101T080000") until the next one between the same stops
    pub fn add_td_transfer(
        mut self,
        from: &str,
        to: &str,
        valid_from: impl AsDateTime,
        duration: impl IntoDuration,
    ) -> Self {
        self.stop_mut(from);
        self.stop_mut(to);
        self.td_footpaths.push((
            from.to_string(),
            to.to_string(),
            valid_from.as_datetime(),
            duration.into_duration(),
        ));
        self
    }

    fn stop_mut(&mut self, name: &str) -> &mut StopInfo {
        let position = match self.stops.iter().position(|stop| stop.name == name) {
            Some(position) => position,
            None => {
                self.stops.push(StopInfo {
                    name: name.to_string(),
                    transfer_duration: None,
                });
                self.stops.len() - 1
            }
        };
        &mut self.stops[position]
    }

    /// Consume the builder to create a timetable
    pub fn build(self) -> Result<Timetable, TimetableError> {
        let calendar = Calendar::new(self.first_date, self.last_date);
        let mut builder = TimetableBuilder::new(calendar.clone());

        let mut locations = HashMap::new();
        for stop in &self.stops {
            let mut location = Location::new(location_id(&stop.name), &stop.name);
            location.transfer_time = stop
                .transfer_duration
                .unwrap_or(self.default_transfer_duration);
            locations.insert(stop.name.clone(), builder.register_location(location));
        }

        for (key, vehicle_journeys) in self.routes() {
            let (stops, clasz, bikes_allowed) = key;
            let stops = stops
                .iter()
                .map(|(name, pickup_allowed, drop_off_allowed)| {
                    Stop::new(locations[name], *pickup_allowed, *drop_off_allowed)
                })
                .collect();
            let route = builder.register_route(stops, vec![clasz], vec![bikes_allowed])?;
            for vj in vehicle_journeys {
                let dates = self
                    .calendars
                    .get(&vj.calendar)
                    .unwrap_or_else(|| panic!("calendar {} does not exist", vj.calendar));
                let bitfield = builder.register_bitfield(Bitfield::from_dates(dates, &calendar))?;
                let stop_times = vj
                    .stop_times
                    .iter()
                    .map(|st| StopTime::new(st.arrival, st.departure))
                    .collect();
                builder.add_transport(
                    route,
                    TransportDescription {
                        name: vj.name.clone(),
                        bitfield,
                        stop_times,
                        section_lines: vj.line.iter().cloned().collect(),
                    },
                )?;
            }
            builder.finish_route()?;
        }

        for (from, to, duration) in &self.footpaths {
            builder.add_footpath(locations[from], locations[to], *duration)?;
        }
        for (from, to, valid_from, duration) in &self.td_footpaths {
            let valid_from =
                UnixTime::from_naive_datetime(valid_from).expect("datetime out of range");
            builder.add_td_footpath(locations[from], locations[to], valid_from, *duration)?;
        }
        builder.build()
    }

    // vehicle journeys gathered in routes, each sorted by departure,
    // with no vehicle journey overtaking another one
    fn routes(&self) -> Vec<(RouteKey, Vec<&VehicleJourney>)> {
        let mut sorted: Vec<&VehicleJourney> = self.vehicle_journeys.iter().collect();
        sorted.sort_by_key(|vj| vj.stop_times.first().map(|st| st.departure));

        let mut routes: Vec<(RouteKey, Vec<&VehicleJourney>)> = Vec::new();
        for vj in sorted {
            let key: RouteKey = (
                vj.stop_times
                    .iter()
                    .map(|st| (st.stop.clone(), st.pickup_allowed, st.drop_off_allowed))
                    .collect(),
                vj.clasz,
                vj.bikes_allowed,
            );
            let existing = routes.iter_mut().find(|(route_key, vehicle_journeys)| {
                *route_key == key
                    && vehicle_journeys
                        .last()
                        .map_or(true, |last| !overtakes(vj, last))
            });
            match existing {
                Some((_, vehicle_journeys)) => vehicle_journeys.push(vj),
                None => routes.push((key, vec![vj])),
            }
        }
        routes
    }
}

// does `vj`, leaving after `previous`, arrive or leave somewhere before it ?
fn overtakes(vj: &VehicleJourney, previous: &VehicleJourney) -> bool {
    vj.stop_times
        .iter()
        .zip(previous.stop_times.iter())
        .any(|(st, prev)| st.arrival < prev.arrival || st.departure < prev.departure)
}

pub fn location_id(name: &str) -> LocationId {
    LocationId::new(SourceIdx::new(0), name)
}

impl<'a> VehicleJourneyBuilder<'a> {
    fn vj(&mut self) -> &mut VehicleJourney {
        &mut self.model.vehicle_journeys[self.vj_idx]
    }

    /// A stop time where passengers may board and alight
    pub fn st(self, name: &str, arrival: impl IntoTime, departure: impl IntoTime) -> Self {
        self.st_detailed(name, arrival, departure, true, true)
    }

    pub fn st_detailed(
        mut self,
        name: &str,
        arrival: impl IntoTime,
        departure: impl IntoTime,
        pickup_allowed: bool,
        drop_off_allowed: bool,
    ) -> Self {
        self.model.stop_mut(name);
        let stop_time = VjStopTime {
            stop: name.to_string(),
            arrival: arrival.into_time(),
            departure: departure.into_time(),
            pickup_allowed,
            drop_off_allowed,
        };
        self.vj().stop_times.push(stop_time);
        self
    }

    pub fn calendar(mut self, id: &str) -> Self {
        self.vj().calendar = id.to_string();
        self
    }

    pub fn clasz(mut self, clasz: Clasz) -> Self {
        self.vj().clasz = clasz;
        self
    }

    pub fn bikes_allowed(mut self) -> Self {
        self.vj().bikes_allowed = true;
        self
    }

    pub fn line(mut self, name: &str) -> Self {
        self.vj().line = Some(name.to_string());
        self
    }
}

pub trait IntoTime {
    fn into_time(&self) -> MinutesAfterMidnight;
}

impl IntoTime for MinutesAfterMidnight {
    fn into_time(&self) -> MinutesAfterMidnight {
        *self
    }
}

impl IntoTime for &str {
    // Note: if the string is not in the right format, this conversion will fail
    fn into_time(&self) -> MinutesAfterMidnight {
        self.parse().expect("invalid time format")
    }
}

pub trait IntoDuration {
    fn into_duration(&self) -> PositiveDuration;
}

impl IntoDuration for PositiveDuration {
    fn into_duration(&self) -> PositiveDuration {
        *self
    }
}

impl IntoDuration for &str {
    // Note: if the string is not in the right format, this conversion will fail
    fn into_duration(&self) -> PositiveDuration {
        self.parse().expect("invalid duration format")
    }
}

pub trait AsDate {
    fn as_date(&self) -> NaiveDate;
}

impl AsDate for NaiveDate {
    fn as_date(&self) -> NaiveDate {
        *self
    }
}

impl AsDate for &str {
    // Note: if the string is not in the right format, this conversion will fail
    fn as_date(&self) -> NaiveDate {
        NaiveDate::parse_from_str(self, "%Y-%m-%d").expect("invalid date format")
    }
}

pub trait AsDateTime {
    fn as_datetime(&self) -> NaiveDateTime;
}

impl AsDateTime for NaiveDateTime {
    fn as_datetime(&self) -> NaiveDateTime {
        *self
    }
}

impl AsDateTime for &str {
    // Note: if the string is not in the right format, this conversion will fail
    fn as_datetime(&self) -> NaiveDateTime {
        launch::datetime::parse_datetime(self).expect("invalid datetime format")
    }
}
