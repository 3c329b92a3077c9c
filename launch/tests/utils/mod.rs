#![allow(dead_code)]
pub mod model_builder;

use anyhow::{format_err, Error};
use launch::config::RequestParams;
use launch::datetime::{parse_instant, DateTimeRepresent};
use launch::solver::{RequestInput, Solver};
use launch::transit_raptor::tracing::debug;
use launch::transit_raptor::transit_data::LocationIdx;
use launch::transit_raptor::{
    Journey, Offset, PositiveDuration, StartTime, Timetable, UnixTime, ViaStop,
};

pub use launch::logger::init_test_logger;

pub struct Config {
    pub request_params: RequestParams,

    pub datetime: StartTime,

    pub datetime_represent: DateTimeRepresent,

    /// stops the traveller may leave from, with the time needed to reach them
    pub start: Vec<(String, PositiveDuration)>,

    /// stops the traveller may go to, with the time needed to leave them
    pub end: Vec<(String, PositiveDuration)>,

    /// stops to go through, with the minimum time to spend there
    pub via_stops: Vec<(String, PositiveDuration)>,
}

impl Config {
    /// `datetime` looks like "20200101T085900", in UTC
    pub fn new(datetime: &str, start: &str, end: &str) -> Self {
        Config {
            request_params: Default::default(),
            datetime: StartTime::Instant(instant(datetime)),
            datetime_represent: Default::default(),
            start: vec![(start.to_string(), PositiveDuration::zero())],
            end: vec![(end.to_string(), PositiveDuration::zero())],
            via_stops: Vec::new(),
        }
    }

    pub fn arrival(mut self) -> Self {
        self.datetime_represent = DateTimeRepresent::Arrival;
        self
    }

    pub fn interval(mut self, from: &str, to: &str) -> Self {
        self.datetime = StartTime::Interval {
            from: instant(from),
            to: instant(to),
        };
        self
    }

    pub fn via(mut self, stop: &str, stay: &str) -> Self {
        let stay = stay.parse().expect("invalid duration format");
        self.via_stops.push((stop.to_string(), stay));
        self
    }
}

pub fn instant(datetime: &str) -> UnixTime {
    parse_instant(datetime).expect("invalid datetime format")
}

pub fn location(timetable: &Timetable, name: &str) -> Result<LocationIdx, Error> {
    timetable
        .locations()
        .find(&model_builder::location_id(name))
        .ok_or_else(|| format_err!("stop {} does not exist", name))
}

fn make_offsets(
    timetable: &Timetable,
    stops: &[(String, PositiveDuration)],
) -> Result<Vec<Offset>, Error> {
    stops
        .iter()
        .map(|(name, duration)| Ok(Offset::new(location(timetable, name)?, *duration)))
        .collect()
}

pub fn make_request_from_config(
    timetable: &Timetable,
    config: &Config,
) -> Result<RequestInput, Error> {
    let via_stops = config
        .via_stops
        .iter()
        .map(|(name, stay)| Ok(ViaStop::new(location(timetable, name)?, *stay)))
        .collect::<Result<_, Error>>()?;
    Ok(RequestInput {
        datetime: config.datetime,
        departures: make_offsets(timetable, &config.start)?,
        arrivals: make_offsets(timetable, &config.end)?,
        via_stops,
    })
}

pub fn build_and_solve(timetable: &Timetable, config: &Config) -> Result<Vec<Journey>, Error> {
    let mut solver = Solver::new();
    let request_input = make_request_from_config(timetable, config)?;
    solve_with(&mut solver, timetable, &request_input, config)
}

pub fn solve_with(
    solver: &mut Solver,
    timetable: &Timetable,
    request_input: &RequestInput,
    config: &Config,
) -> Result<Vec<Journey>, Error> {
    let journeys = solver.solve_request(
        timetable,
        request_input,
        &config.request_params,
        &config.datetime_represent,
    )?;
    for journey in journeys.iter() {
        debug!("{}", journey.print(timetable)?);
    }
    Ok(journeys)
}

/// Names of the transports used, in travel order
pub fn transport_names<'a>(timetable: &'a Timetable, journey: &Journey) -> Vec<&'a str> {
    journey
        .transports()
        .map(|transport| timetable.transport_name(transport))
        .collect()
}

/// Names of the stops where each leg of `journey` begins, in travel order
pub fn leg_origins<'a>(timetable: &'a Timetable, journey: &Journey) -> Vec<&'a str> {
    journey
        .legs
        .iter()
        .map(|leg| timetable.locations().name(leg.from))
        .collect()
}
