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

use fixedbitset::FixedBitSet;

use super::matrix::FlatMatrix;
use crate::time::{DeltaTime, Direction};
use crate::transit_data::LocationIdx;

/// Maximum number of transfers a search can be configured with.
pub const MAX_TRANSFERS: u8 = 7;

/// Round 0 holds the starting times, round k the journeys using k vehicles.
pub const MAX_ROUNDS: usize = MAX_TRANSFERS as usize + 2;

/// Maximum number of via stops in a query.
pub const MAX_VIAS: usize = 2;

/// Times of a location, one per via progress level :
/// `times[v]` is the best time known for partial journeys that
/// already went through the first `v` via stops.
pub type ViaTimes<const LEVELS: usize> = [DeltaTime; LEVELS];

const UNREACHED: DeltaTime = DeltaTime::INFEASIBLE;

/// Memory used by a search.
///
/// `LEVELS` is the number of via progress levels, that is the number of via
/// stops of the queries this state can serve, plus one.
///
/// The state must be `resize`d for each timetable before being used, and
/// `reset` before each search.
///
/// During round `k` of a search :
/// - `round_times_start[k-1]` holds the times at which locations can be left
///   by boarding a vehicle, `best_start` the best such times over rounds
///   `0..k`,
/// - `tmp` receives the times at which locations are reached by vehicle,
///   and is copied into `round_times_end[k]` by `finish_round(k)`,
/// - `best` holds the best vehicle arrivals over rounds `1..k`.
#[derive(Debug)]
pub struct RaptorState<const LEVELS: usize> {
    nb_of_locations: usize,
    nb_of_routes: usize,
    nb_of_rt_transports: usize,

    pub(crate) tmp: Vec<ViaTimes<LEVELS>>,
    pub(crate) best: Vec<ViaTimes<LEVELS>>,
    pub(crate) best_start: Vec<ViaTimes<LEVELS>>,
    pub(crate) round_times_start: FlatMatrix<ViaTimes<LEVELS>>,
    pub(crate) round_times_end: FlatMatrix<ViaTimes<LEVELS>>,

    pub(crate) station_mark: FixedBitSet,
    pub(crate) prev_station_mark: FixedBitSet,
    pub(crate) route_mark: FixedBitSet,
    pub(crate) rt_transport_mark: FixedBitSet,
    pub(crate) end_reachable: FixedBitSet,
}

impl<const LEVELS: usize> Default for RaptorState<LEVELS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const LEVELS: usize> RaptorState<LEVELS> {
    pub fn new() -> Self {
        Self {
            nb_of_locations: 0,
            nb_of_routes: 0,
            nb_of_rt_transports: 0,
            tmp: Vec::new(),
            best: Vec::new(),
            best_start: Vec::new(),
            round_times_start: FlatMatrix::new(MAX_ROUNDS, 0, [UNREACHED; LEVELS]),
            round_times_end: FlatMatrix::new(MAX_ROUNDS, 0, [UNREACHED; LEVELS]),
            station_mark: FixedBitSet::new(),
            prev_station_mark: FixedBitSet::new(),
            route_mark: FixedBitSet::new(),
            rt_transport_mark: FixedBitSet::new(),
            end_reachable: FixedBitSet::new(),
        }
    }

    /// Number of via stops served by this state.
    pub fn nb_of_vias(&self) -> usize {
        LEVELS - 1
    }

    /// Reallocates every array for a timetable of the given dimensions.
    /// Previous contents are lost.
    pub fn resize(
        &mut self,
        nb_of_locations: usize,
        nb_of_routes: usize,
        nb_of_rt_transports: usize,
    ) -> &mut Self {
        self.nb_of_locations = nb_of_locations;
        self.nb_of_routes = nb_of_routes;
        self.nb_of_rt_transports = nb_of_rt_transports;

        self.tmp.clear();
        self.tmp.resize(nb_of_locations, [UNREACHED; LEVELS]);
        self.best.clear();
        self.best.resize(nb_of_locations, [UNREACHED; LEVELS]);
        self.best_start.clear();
        self.best_start.resize(nb_of_locations, [UNREACHED; LEVELS]);
        self.round_times_start
            .resize(MAX_ROUNDS, nb_of_locations, [UNREACHED; LEVELS]);
        self.round_times_end
            .resize(MAX_ROUNDS, nb_of_locations, [UNREACHED; LEVELS]);

        self.station_mark = FixedBitSet::with_capacity(nb_of_locations);
        self.prev_station_mark = FixedBitSet::with_capacity(nb_of_locations);
        self.route_mark = FixedBitSet::with_capacity(nb_of_routes);
        self.rt_transport_mark = FixedBitSet::with_capacity(nb_of_rt_transports);
        self.end_reachable = FixedBitSet::with_capacity(nb_of_locations);
        self
    }

    pub fn is_sized_for(&self, nb_of_locations: usize, nb_of_routes: usize) -> bool {
        self.nb_of_locations == nb_of_locations && self.nb_of_routes == nb_of_routes
    }

    pub fn nb_of_locations(&self) -> usize {
        self.nb_of_locations
    }

    pub fn nb_of_routes(&self) -> usize {
        self.nb_of_routes
    }

    pub fn nb_of_rt_transports(&self) -> usize {
        self.nb_of_rt_transports
    }

    /// Sets every time to unreached and clears every mark.
    pub fn reset(&mut self) {
        self.tmp.fill([UNREACHED; LEVELS]);
        self.best.fill([UNREACHED; LEVELS]);
        self.best_start.fill([UNREACHED; LEVELS]);
        self.round_times_start.fill([UNREACHED; LEVELS]);
        self.round_times_end.fill([UNREACHED; LEVELS]);
        self.station_mark.clear();
        self.prev_station_mark.clear();
        self.route_mark.clear();
        self.rt_transport_mark.clear();
        self.end_reachable.clear();
    }

    /// Current marks become the previous ones, and current marks are cleared.
    pub fn rotate_marks(&mut self) {
        std::mem::swap(&mut self.station_mark, &mut self.prev_station_mark);
        self.station_mark.clear();
    }

    pub fn any_station_marked(&self) -> bool {
        self.station_mark.count_ones(..) > 0
    }

    /// Ends round `round` :
    /// - `best` is improved level by level with `tmp`,
    /// - `tmp` is saved in `round_times_end[round]`, then cleared,
    /// - `best_start` is improved with `round_times_start[round]`.
    pub fn finish_round(&mut self, round: usize, direction: Direction) {
        debug_assert!(round < MAX_ROUNDS);
        fold_best(&mut self.best, &self.tmp, direction);
        self.round_times_end.row_mut(round).copy_from_slice(&self.tmp);
        self.tmp.fill([UNREACHED; LEVELS]);
        fold_best(
            &mut self.best_start,
            self.round_times_start.row(round),
            direction,
        );
    }

    pub fn tmp(&self, location: LocationIdx) -> &ViaTimes<LEVELS> {
        &self.tmp[location.idx()]
    }

    /// Best times at which `location` was reached by vehicle so far.
    pub fn best(&self, location: LocationIdx) -> &ViaTimes<LEVELS> {
        &self.best[location.idx()]
    }

    /// Best times at which `location` could be left so far.
    pub fn best_start(&self, location: LocationIdx) -> &ViaTimes<LEVELS> {
        &self.best_start[location.idx()]
    }

    /// Times at which `location` can be left after `round` vehicles.
    pub fn round_start(&self, round: usize, location: LocationIdx) -> &ViaTimes<LEVELS> {
        &self.round_times_start[(round, location.idx())]
    }

    /// Times at which `location` is reached by the `round`-th vehicle.
    pub fn round_end(&self, round: usize, location: LocationIdx) -> &ViaTimes<LEVELS> {
        &self.round_times_end[(round, location.idx())]
    }

    pub fn is_end_reachable(&self, location: LocationIdx) -> bool {
        self.end_reachable.contains(location.idx())
    }
}

fn fold_best<const LEVELS: usize>(
    best: &mut [ViaTimes<LEVELS>],
    times: &[ViaTimes<LEVELS>],
    direction: Direction,
) {
    for (best, time) in best.iter_mut().zip(times) {
        for level in 0..LEVELS {
            best[level] = direction.best(best[level], time[level]);
        }
    }
}
