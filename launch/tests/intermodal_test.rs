mod utils;
use anyhow::Error;
use launch::datetime::DateTimeRepresent;
use launch::transit_raptor::{LegKind, PositiveDuration, Timetable};
use rstest::rstest;
use utils::model_builder::ModelBuilder;
use utils::{build_and_solve, init_test_logger, instant, leg_origins, transport_names, Config};

fn two_routes_one_transfer() -> Result<Timetable, Error> {
    let timetable = ModelBuilder::default()
        .vj("route_1", |vj_builder| {
            vj_builder
                .st("A", "05:30:00", "05:30:00")
                .st("B", "06:30:00", "06:30:00");
        })
        .vj("route_2", |vj_builder| {
            vj_builder
                .st("B", "06:45:00", "06:45:00")
                .st("C", "07:45:00", "07:45:00");
        })
        .transfer_duration("B", "00:02:00")
        .build()?;
    Ok(timetable)
}

fn with_offsets(mut config: Config) -> Config {
    config.start = vec![("A".to_string(), PositiveDuration::from_minutes(10))];
    config.end = vec![("C".to_string(), PositiveDuration::from_minutes(15))];
    config
}

#[rstest]
#[case(DateTimeRepresent::Departure, "20200101T052000")]
#[case(DateTimeRepresent::Arrival, "20200101T080000")]
fn one_transfer_with_access_and_egress(
    #[case] datetime_represent: DateTimeRepresent,
    #[case] datetime: &str,
) -> Result<(), Error> {
    let _log_guard = init_test_logger();
    let timetable = two_routes_one_transfer()?;

    let mut config = with_offsets(Config::new(datetime, "A", "C"));
    config.datetime_represent = datetime_represent;
    let journeys = build_and_solve(&timetable, &config)?;

    assert_eq!(journeys.len(), 1);
    let journey = &journeys[0];
    assert_eq!(journey.departure, instant("20200101T052000"));
    assert_eq!(journey.arrival, instant("20200101T080000"));
    assert_eq!(journey.nb_of_transfers, 1);
    assert_eq!(transport_names(&timetable, journey), vec!["route_1", "route_2"]);

    assert_eq!(leg_origins(&timetable, journey), vec!["A", "A", "B", "C"]);
    let access = &journey.legs[0];
    assert_eq!(access.kind, LegKind::Offset { transport_mode_id: 0 });
    assert_eq!(access.departure, instant("20200101T052000"));
    assert_eq!(access.arrival, instant("20200101T053000"));
    let first_vehicle = &journey.legs[1];
    assert_eq!(first_vehicle.departure, instant("20200101T053000"));
    assert_eq!(first_vehicle.arrival, instant("20200101T063000"));
    let second_vehicle = &journey.legs[2];
    assert_eq!(second_vehicle.departure, instant("20200101T064500"));
    assert_eq!(second_vehicle.arrival, instant("20200101T074500"));
    let egress = &journey.legs[3];
    assert_eq!(egress.departure, instant("20200101T074500"));
    assert_eq!(egress.arrival, instant("20200101T080000"));
    Ok(())
}

#[test]
fn forward_and_backward_use_the_same_transports() -> Result<(), Error> {
    let _log_guard = init_test_logger();
    let timetable = two_routes_one_transfer()?;

    let forward = build_and_solve(
        &timetable,
        &with_offsets(Config::new("20200101T052000", "A", "C")),
    )?;
    let backward = build_and_solve(
        &timetable,
        &with_offsets(Config::new("20200101T080000", "A", "C").arrival()),
    )?;
    assert_eq!(forward, backward);
    Ok(())
}

#[test]
fn no_journey_when_the_transfer_is_missed() -> Result<(), Error> {
    let _log_guard = init_test_logger();
    let timetable = ModelBuilder::default()
        .vj("route_1", |vj_builder| {
            vj_builder
                .st("A", "05:30:00", "05:30:00")
                .st("B", "06:30:00", "06:30:00");
        })
        .vj("route_2", |vj_builder| {
            vj_builder
                .st("B", "06:45:00", "06:45:00")
                .st("C", "07:45:00", "07:45:00");
        })
        .transfer_duration("B", "00:20:00")
        .build()?;

    let forward = build_and_solve(
        &timetable,
        &with_offsets(Config::new("20200101T052000", "A", "C")),
    )?;
    assert!(forward.is_empty());
    let backward = build_and_solve(
        &timetable,
        &with_offsets(Config::new("20200101T080000", "A", "C").arrival()),
    )?;
    assert!(backward.is_empty());
    Ok(())
}

#[rstest]
#[case(DateTimeRepresent::Departure, "20200101T050000", "20200101T063000")]
#[case(DateTimeRepresent::Arrival, "20200101T073000", "20200101T083000")]
fn interval_search_keeps_non_dominated_journeys(
    #[case] datetime_represent: DateTimeRepresent,
    #[case] from: &str,
    #[case] to: &str,
) -> Result<(), Error> {
    let _log_guard = init_test_logger();
    let timetable = ModelBuilder::default()
        .vj("r1_early", |vj_builder| {
            vj_builder
                .st("A", "05:30:00", "05:30:00")
                .st("B", "06:30:00", "06:30:00");
        })
        .vj("r1_late", |vj_builder| {
            vj_builder
                .st("A", "06:30:00", "06:30:00")
                .st("B", "07:00:00", "07:00:00");
        })
        .vj("r2_early", |vj_builder| {
            vj_builder
                .st("B", "06:45:00", "06:45:00")
                .st("C", "07:45:00", "07:45:00");
        })
        .vj("r2_late", |vj_builder| {
            vj_builder
                .st("B", "07:15:00", "07:15:00")
                .st("C", "08:15:00", "08:15:00");
        })
        .transfer_duration("B", "00:02:00")
        .build()?;

    let mut config = with_offsets(Config::new(from, "A", "C")).interval(from, to);
    config.datetime_represent = datetime_represent;
    let journeys = build_and_solve(&timetable, &config)?;

    assert_eq!(journeys.len(), 2);
    assert_eq!(journeys[0].departure, instant("20200101T052000"));
    assert_eq!(journeys[0].arrival, instant("20200101T080000"));
    assert_eq!(
        transport_names(&timetable, &journeys[0]),
        vec!["r1_early", "r2_early"]
    );
    assert_eq!(journeys[1].departure, instant("20200101T062000"));
    assert_eq!(journeys[1].arrival, instant("20200101T083000"));
    assert_eq!(
        transport_names(&timetable, &journeys[1]),
        vec!["r1_late", "r2_late"]
    );
    Ok(())
}

#[test]
fn interval_search_drops_dominated_departures() -> Result<(), Error> {
    let _log_guard = init_test_logger();
    let timetable = ModelBuilder::default()
        .vj("early", |vj_builder| {
            vj_builder
                .st("A", "05:30:00", "05:30:00")
                .st("B", "06:30:00", "06:30:00");
        })
        .vj("later", |vj_builder| {
            vj_builder
                .st("A", "05:50:00", "05:50:00")
                .st("B", "06:35:00", "06:35:00");
        })
        .vj("connection", |vj_builder| {
            vj_builder
                .st("B", "06:45:00", "06:45:00")
                .st("C", "07:45:00", "07:45:00");
        })
        .build()?;

    let config = with_offsets(Config::new("20200101T050000", "A", "C"))
        .interval("20200101T050000", "20200101T060000");
    let journeys = build_and_solve(&timetable, &config)?;

    assert_eq!(journeys.len(), 1);
    assert_eq!(journeys[0].departure, instant("20200101T054000"));
    assert_eq!(journeys[0].arrival, instant("20200101T080000"));
    assert_eq!(
        transport_names(&timetable, &journeys[0]),
        vec!["later", "connection"]
    );
    Ok(())
}

#[test]
fn access_through_a_footpath() -> Result<(), Error> {
    let _log_guard = init_test_logger();
    let timetable = ModelBuilder::default()
        .vj("toto", |vj_builder| {
            vj_builder
                .st("B", "10:00:00", "10:00:00")
                .st("C", "10:30:00", "10:30:00");
        })
        .add_transfer("A", "B", "00:05:00")
        .build()?;

    let config = Config::new("20200101T095000", "A", "C");
    let journeys = build_and_solve(&timetable, &config)?;
    assert_eq!(journeys.len(), 1);
    assert_eq!(leg_origins(&timetable, &journeys[0]), vec!["A", "A", "B", "C"]);
    assert_eq!(journeys[0].legs[1].kind, LegKind::Footpath);
    assert_eq!(journeys[0].legs[1].arrival, instant("20200101T095500"));

    let config = Config::new("20200101T103000", "A", "C").arrival();
    let journeys = build_and_solve(&timetable, &config)?;
    assert_eq!(journeys.len(), 1);
    assert_eq!(journeys[0].departure, instant("20200101T095500"));
    assert_eq!(leg_origins(&timetable, &journeys[0]), vec!["A", "A", "B", "C"]);
    Ok(())
}
