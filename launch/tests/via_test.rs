mod utils;
use anyhow::Error;
use launch::datetime::DateTimeRepresent;
use launch::solver::Solver;
use launch::transit_raptor::{BadRequest, PositiveDuration, Timetable};
use rstest::rstest;
use utils::model_builder::ModelBuilder;
use utils::{
    build_and_solve, init_test_logger, instant, make_request_from_config, solve_with,
    transport_names, Config,
};

// "bypass" is the fastest way from A to C, "direct" goes through V
fn model_with_via() -> Result<Timetable, Error> {
    let timetable = ModelBuilder::default()
        .vj("bypass", |vj_builder| {
            vj_builder
                .st("A", "08:00:00", "08:00:00")
                .st("C", "08:40:00", "08:40:00");
        })
        .vj("direct", |vj_builder| {
            vj_builder
                .st("A", "08:00:00", "08:00:00")
                .st("V", "08:30:00", "08:30:00")
                .st("C", "09:00:00", "09:00:00");
        })
        .vj("after_via", |vj_builder| {
            vj_builder
                .st("V", "08:45:00", "08:45:00")
                .st("C", "09:15:00", "09:15:00");
        })
        .build()?;
    Ok(timetable)
}

#[test]
fn without_via() -> Result<(), Error> {
    let _log_guard = init_test_logger();
    let timetable = model_with_via()?;

    let journeys = build_and_solve(&timetable, &Config::new("20200101T075900", "A", "C"))?;
    assert_eq!(journeys.len(), 1);
    assert_eq!(transport_names(&timetable, &journeys[0]), vec!["bypass"]);
    Ok(())
}

#[rstest]
#[case(DateTimeRepresent::Departure, "20200101T075900")]
#[case(DateTimeRepresent::Arrival, "20200101T090000")]
fn riding_through_a_via(
    #[case] datetime_represent: DateTimeRepresent,
    #[case] datetime: &str,
) -> Result<(), Error> {
    let _log_guard = init_test_logger();
    let timetable = model_with_via()?;

    let mut config = Config::new(datetime, "A", "C").via("V", "00:00:00");
    config.datetime_represent = datetime_represent;
    let journeys = build_and_solve(&timetable, &config)?;

    assert_eq!(journeys.len(), 1);
    assert_eq!(transport_names(&timetable, &journeys[0]), vec!["direct"]);
    assert_eq!(journeys[0].nb_of_transfers, 0);
    assert_eq!(journeys[0].legs[1].arrival, instant("20200101T090000"));
    Ok(())
}

#[rstest]
#[case(DateTimeRepresent::Departure, "20200101T075900")]
#[case(DateTimeRepresent::Arrival, "20200101T091500")]
fn staying_at_a_via(
    #[case] datetime_represent: DateTimeRepresent,
    #[case] datetime: &str,
) -> Result<(), Error> {
    let _log_guard = init_test_logger();
    let timetable = model_with_via()?;

    let mut config = Config::new(datetime, "A", "C").via("V", "00:10:00");
    config.datetime_represent = datetime_represent;
    let journeys = build_and_solve(&timetable, &config)?;

    assert_eq!(journeys.len(), 1);
    let journey = &journeys[0];
    assert_eq!(transport_names(&timetable, journey), vec!["direct", "after_via"]);
    assert_eq!(journey.nb_of_transfers, 1);
    assert_eq!(journey.legs[1].arrival, instant("20200101T083000"));
    assert_eq!(journey.legs[2].departure, instant("20200101T084500"));
    assert_eq!(journey.legs[2].arrival, instant("20200101T091500"));
    Ok(())
}

#[test]
fn stay_longer_than_the_connection() -> Result<(), Error> {
    let _log_guard = init_test_logger();
    let timetable = model_with_via()?;

    let config = Config::new("20200101T075900", "A", "C").via("V", "00:20:00");
    let journeys = build_and_solve(&timetable, &config)?;
    assert!(journeys.is_empty());
    Ok(())
}

#[rstest]
#[case(12, 0)]
#[case(15, 1)]
#[case(20, 1)]
fn maximum_stay_at_a_via(
    #[case] max_stay_minutes: u16,
    #[case] nb_of_journeys: usize,
) -> Result<(), Error> {
    let _log_guard = init_test_logger();
    let timetable = model_with_via()?;

    let config = Config::new("20200101T075900", "A", "C").via("V", "00:10:00");
    let mut request_input = make_request_from_config(&timetable, &config)?;
    request_input.via_stops[0].max_stay = Some(PositiveDuration::from_minutes(max_stay_minutes));

    let mut solver = Solver::new();
    let journeys = solve_with(&mut solver, &timetable, &request_input, &config)?;
    assert_eq!(journeys.len(), nb_of_journeys);
    Ok(())
}

#[test]
fn two_vias_in_travel_order() -> Result<(), Error> {
    let _log_guard = init_test_logger();
    let timetable = ModelBuilder::default()
        .vj("first", |vj_builder| {
            vj_builder
                .st("A", "08:00:00", "08:00:00")
                .st("V", "08:10:00", "08:10:00")
                .st("W", "08:20:00", "08:20:00")
                .st("C", "08:30:00", "08:30:00");
        })
        .vj("back", |vj_builder| {
            vj_builder
                .st("W", "08:40:00", "08:40:00")
                .st("V", "08:50:00", "08:50:00")
                .st("C", "09:00:00", "09:00:00");
        })
        .build()?;

    let config = Config::new("20200101T075900", "A", "C")
        .via("V", "00:00:00")
        .via("W", "00:00:00");
    let journeys = build_and_solve(&timetable, &config)?;
    assert_eq!(journeys.len(), 1);
    assert_eq!(transport_names(&timetable, &journeys[0]), vec!["first"]);

    let config = Config::new("20200101T075900", "A", "C")
        .via("W", "00:00:00")
        .via("V", "00:00:00");
    let journeys = build_and_solve(&timetable, &config)?;
    assert_eq!(journeys.len(), 1);
    assert_eq!(transport_names(&timetable, &journeys[0]), vec!["first", "back"]);
    assert_eq!(journeys[0].arrival, instant("20200101T090000"));
    Ok(())
}

#[test]
fn too_many_vias() -> Result<(), Error> {
    let _log_guard = init_test_logger();
    let timetable = model_with_via()?;

    let config = Config::new("20200101T075900", "A", "C")
        .via("V", "00:00:00")
        .via("V", "00:00:00")
        .via("V", "00:00:00");
    let request_input = make_request_from_config(&timetable, &config)?;
    let mut solver = Solver::new();
    let result = solver.solve_request(
        &timetable,
        &request_input,
        &config.request_params,
        &config.datetime_represent,
    );
    assert_eq!(result, Err(BadRequest::TooManyVias(3)));
    Ok(())
}
