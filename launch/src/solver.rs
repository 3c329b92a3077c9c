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

use std::time::Instant;

use transit_raptor::tracing::{debug, info};
use transit_raptor::{
    solve, BadRequest, Journey, Offset, Query, RaptorState, StartTime, Timetable, ViaStop,
};

use crate::config::RequestParams;
use crate::datetime::DateTimeRepresent;

/// A request, as the traveller sees it.
#[derive(Debug, Clone)]
pub struct RequestInput {
    /// departure or arrival time, see `DateTimeRepresent`
    pub datetime: StartTime,
    /// where the traveller may leave from
    pub departures: Vec<Offset>,
    /// where the traveller wants to go
    pub arrivals: Vec<Offset>,
    /// in travel order
    pub via_stops: Vec<ViaStop>,
}

/// Keeps one search state per supported number of via stops,
/// so that consecutive requests reuse their allocations.
pub struct Solver {
    no_via: RaptorState<1>,
    one_via: RaptorState<2>,
    two_vias: RaptorState<3>,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self {
            no_via: RaptorState::new(),
            one_via: RaptorState::new(),
            two_vias: RaptorState::new(),
        }
    }

    pub fn solve_request(
        &mut self,
        timetable: &Timetable,
        request_input: &RequestInput,
        request_params: &RequestParams,
        datetime_represent: &DateTimeRepresent,
    ) -> Result<Vec<Journey>, BadRequest> {
        let query = make_query(request_input, request_params, datetime_represent);

        debug!(
            "Start computing {} journeys with {} via stops",
            datetime_represent,
            query.nb_of_vias()
        );
        let request_timer = Instant::now();
        let journeys = match query.nb_of_vias() {
            0 => solve(timetable, sized_for(&mut self.no_via, timetable), &query),
            1 => solve(timetable, sized_for(&mut self.one_via, timetable), &query),
            2 => solve(timetable, sized_for(&mut self.two_vias, timetable), &query),
            nb_of_vias => Err(BadRequest::TooManyVias(nb_of_vias)),
        }?;
        info!(
            "Journeys computed in {} ms",
            request_timer.elapsed().as_millis()
        );

        let max_duration = request_params.max_journey_duration;
        let nb_of_journeys = journeys.len();
        let journeys: Vec<_> = journeys
            .into_iter()
            .filter(|journey| {
                journey
                    .duration()
                    .map_or(false, |duration| duration <= max_duration)
            })
            .collect();
        info!(
            "Nb of journeys found : {}, {} discarded for being longer than {}",
            journeys.len(),
            nb_of_journeys - journeys.len(),
            max_duration
        );
        Ok(journeys)
    }
}

fn make_query(
    request_input: &RequestInput,
    request_params: &RequestParams,
    datetime_represent: &DateTimeRepresent,
) -> Query {
    let direction = datetime_represent.direction();
    let (start, destination) = match datetime_represent {
        DateTimeRepresent::Departure => (&request_input.departures, &request_input.arrivals),
        DateTimeRepresent::Arrival => (&request_input.arrivals, &request_input.departures),
    };
    let mut query = Query::new(request_input.datetime, direction);
    query.start = start.clone();
    query.destination = destination.clone();
    query.via_stops = request_input.via_stops.clone();
    query.allowed_classes = request_params.allowed_classes_mask();
    query.require_bike_transport = request_params.require_bike_transport;
    query.max_transfers = request_params.max_nb_of_transfers;
    query
}

fn sized_for<'a, const LEVELS: usize>(
    state: &'a mut RaptorState<LEVELS>,
    timetable: &Timetable,
) -> &'a mut RaptorState<LEVELS> {
    let nb_of_locations = timetable.nb_of_locations();
    let nb_of_routes = timetable.nb_of_routes();
    if !state.is_sized_for(nb_of_locations, nb_of_routes) {
        debug!(
            "Resizing the search state for {} locations and {} routes",
            nb_of_locations, nb_of_routes
        );
        state.resize(nb_of_locations, nb_of_routes, 0);
    }
    state
}
