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

use serde::{Deserialize, Serialize};
use structopt::StructOpt;

use transit_raptor::transit_data::{Clasz, ClaszMask};
use transit_raptor::PositiveDuration;

#[derive(Debug, Clone, Serialize, Deserialize, StructOpt)]
#[structopt(rename_all = "snake_case")]
#[serde(deny_unknown_fields)]
pub struct RequestParams {
    /// maximum number of transfers in a journey
    #[structopt(long, default_value = DEFAULT_MAX_NB_OF_TRANSFERS)]
    #[serde(default = "default_max_nb_of_transfers")]
    pub max_nb_of_transfers: u8,

    /// maximum duration of a journey
    #[structopt(long, default_value = DEFAULT_MAX_JOURNEY_DURATION)]
    #[serde(default = "default_max_journey_duration")]
    pub max_journey_duration: PositiveDuration,

    /// only use the sections of transports on which a bike can be carried
    #[structopt(long)]
    #[serde(default)]
    pub require_bike_transport: bool,

    /// classes of transport that may be used.
    /// All classes are allowed when none is given.
    #[structopt(long)]
    #[serde(default)]
    pub allowed_classes: Vec<Clasz>,
}

pub const DEFAULT_MAX_NB_OF_TRANSFERS: &str = "6";
pub const DEFAULT_MAX_JOURNEY_DURATION: &str = "24:00:00";

pub fn default_max_nb_of_transfers() -> u8 {
    6
}

pub fn default_max_journey_duration() -> PositiveDuration {
    PositiveDuration::from_hm(24, 0)
}

impl RequestParams {
    pub fn allowed_classes_mask(&self) -> ClaszMask {
        if self.allowed_classes.is_empty() {
            ClaszMask::all()
        } else {
            self.allowed_classes.iter().copied().collect()
        }
    }
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            max_nb_of_transfers: default_max_nb_of_transfers(),
            max_journey_duration: default_max_journey_duration(),
            require_bike_transport: false,
            allowed_classes: Vec::new(),
        }
    }
}
