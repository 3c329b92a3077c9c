mod utils;
use anyhow::Error;
use launch::transit_raptor::transit_data::Clasz;
use launch::transit_raptor::{LegKind, PositiveDuration};
use utils::model_builder::ModelBuilder;
use utils::{build_and_solve, init_test_logger, instant, leg_origins, transport_names, Config};

#[test]
fn test_simple_routing() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let timetable = ModelBuilder::default()
        .vj("toto", |vj_builder| {
            vj_builder
                .line("bob")
                .st("A", "10:00:00", "10:00:00")
                .st("B", "10:05:00", "10:05:00")
                .st("C", "10:10:00", "10:10:00");
        })
        .build()?;

    let config = Config::new("20200101T095900", "A", "B");
    let journeys = build_and_solve(&timetable, &config)?;

    assert_eq!(journeys.len(), 1);
    let journey = &journeys[0];
    assert_eq!(transport_names(&timetable, journey), vec!["toto"]);
    assert_eq!(journey.nb_of_transfers, 0);
    assert_eq!(journey.departure, instant("20200101T095900"));
    assert_eq!(journey.arrival, instant("20200101T100500"));
    assert_eq!(journey.duration(), Some(PositiveDuration::from_minutes(6)));

    assert_eq!(journey.legs.len(), 3);
    assert_eq!(leg_origins(&timetable, journey), vec!["A", "A", "B"]);
    let vehicle_leg = &journey.legs[1];
    assert_eq!(vehicle_leg.departure, instant("20200101T100000"));
    assert_eq!(vehicle_leg.arrival, instant("20200101T100500"));
    match vehicle_leg.kind {
        LegKind::Transport {
            transport,
            board_position,
            alight_position,
            ..
        } => {
            assert_eq!(board_position, 0);
            assert_eq!(alight_position, 1);
            assert_eq!(timetable.line_of(transport, board_position), Some("bob"));
        }
        _ => panic!("the second leg should be a transport"),
    }
    assert!(journey.print(&timetable)?.contains("toto (bob)"));
    Ok(())
}

#[test]
fn test_routing_with_transfers() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let timetable = ModelBuilder::default()
        .vj("toto", |vj_builder| {
            vj_builder
                .st("A", "10:00:00", "10:00:00")
                .st("B", "10:05:00", "10:05:00")
                .st("C", "10:10:00", "10:10:00");
        })
        .vj("tata", |vj_builder| {
            vj_builder
                .st("E", "10:05:00", "10:05:00")
                .st("F", "10:20:00", "10:20:00")
                .st("G", "10:30:00", "10:30:00");
        })
        .add_transfer("B", "F", "00:02:00")
        .build()?;

    let config = Config::new("20200101T095900", "A", "G");
    let journeys = build_and_solve(&timetable, &config)?;

    assert_eq!(journeys.len(), 1);
    let journey = &journeys[0];
    assert_eq!(transport_names(&timetable, journey), vec!["toto", "tata"]);
    assert_eq!(journey.nb_of_transfers, 1);
    assert_eq!(journey.arrival, instant("20200101T103000"));
    assert_eq!(journey.duration(), Some(PositiveDuration::from_minutes(31)));

    assert_eq!(leg_origins(&timetable, journey), vec!["A", "A", "B", "F", "G"]);
    let transfer_leg = &journey.legs[2];
    assert_eq!(transfer_leg.kind, LegKind::Footpath);
    assert_eq!(transfer_leg.departure, instant("20200101T100500"));
    assert_eq!(transfer_leg.arrival, instant("20200101T100700"));

    let second_vehicle = &journey.legs[3];
    assert_eq!(second_vehicle.departure, instant("20200101T102000"));
    assert_eq!(second_vehicle.arrival, instant("20200101T103000"));
    Ok(())
}

#[test]
fn fewer_transfers_are_kept_when_arriving_later() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let timetable = ModelBuilder::default()
        .vj("direct", |vj_builder| {
            vj_builder
                .st("A", "10:00:00", "10:00:00")
                .st("C", "11:00:00", "11:00:00");
        })
        .vj("first", |vj_builder| {
            vj_builder
                .st("A", "10:00:00", "10:00:00")
                .st("B", "10:10:00", "10:10:00");
        })
        .vj("second", |vj_builder| {
            vj_builder
                .st("B", "10:15:00", "10:15:00")
                .st("C", "10:30:00", "10:30:00");
        })
        .build()?;

    let config = Config::new("20200101T095900", "A", "C");
    let journeys = build_and_solve(&timetable, &config)?;

    assert_eq!(journeys.len(), 2);
    assert_eq!(transport_names(&timetable, &journeys[0]), vec!["first", "second"]);
    assert_eq!(journeys[0].arrival, instant("20200101T103000"));
    assert_eq!(journeys[0].nb_of_transfers, 1);
    assert_eq!(transport_names(&timetable, &journeys[1]), vec!["direct"]);
    assert_eq!(journeys[1].arrival, instant("20200101T110000"));
    assert_eq!(journeys[1].nb_of_transfers, 0);

    let mut config = Config::new("20200101T095900", "A", "C");
    config.request_params.max_nb_of_transfers = 0;
    let journeys = build_and_solve(&timetable, &config)?;
    assert_eq!(journeys.len(), 1);
    assert_eq!(transport_names(&timetable, &journeys[0]), vec!["direct"]);
    Ok(())
}

#[test]
fn transfer_duration_is_respected() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let timetable = ModelBuilder::default()
        .vj("first", |vj_builder| {
            vj_builder
                .st("A", "10:00:00", "10:00:00")
                .st("B", "10:10:00", "10:10:00");
        })
        .vj("too_early", |vj_builder| {
            vj_builder
                .st("B", "10:14:00", "10:14:00")
                .st("C", "10:20:00", "10:20:00");
        })
        .vj("on_time", |vj_builder| {
            vj_builder
                .st("B", "10:15:00", "10:15:00")
                .st("C", "10:25:00", "10:25:00");
        })
        .transfer_duration("B", "00:05:00")
        .build()?;

    let config = Config::new("20200101T095900", "A", "C");
    let journeys = build_and_solve(&timetable, &config)?;

    assert_eq!(journeys.len(), 1);
    assert_eq!(transport_names(&timetable, &journeys[0]), vec!["first", "on_time"]);
    assert_eq!(journeys[0].arrival, instant("20200101T102500"));
    Ok(())
}

#[test]
fn next_day_departure() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let timetable = ModelBuilder::new("2020-01-01", "2020-01-02")
        .vj("toto", |vj_builder| {
            vj_builder
                .st("A", "10:00:00", "10:00:00")
                .st("B", "10:05:00", "10:05:00");
        })
        .build()?;

    let config = Config::new("20200101T110000", "A", "B");
    let journeys = build_and_solve(&timetable, &config)?;

    assert_eq!(journeys.len(), 1);
    assert_eq!(journeys[0].legs[1].departure, instant("20200102T100000"));
    assert_eq!(journeys[0].arrival, instant("20200102T100500"));
    Ok(())
}

#[test]
fn no_journey_after_the_last_departure() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let timetable = ModelBuilder::default()
        .vj("toto", |vj_builder| {
            vj_builder
                .st("A", "10:00:00", "10:00:00")
                .st("B", "10:05:00", "10:05:00");
        })
        .build()?;

    let config = Config::new("20200101T100100", "A", "B");
    let journeys = build_and_solve(&timetable, &config)?;
    assert!(journeys.is_empty());
    Ok(())
}

#[test]
fn pickup_and_drop_off_restrictions() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let timetable = ModelBuilder::default()
        .vj("toto", |vj_builder| {
            vj_builder
                .st_detailed("A", "10:00:00", "10:00:00", false, true)
                .st("B", "10:05:00", "10:05:00")
                .st_detailed("C", "10:10:00", "10:10:00", true, false)
                .st("D", "10:15:00", "10:15:00");
        })
        .build()?;

    let journeys = build_and_solve(&timetable, &Config::new("20200101T095900", "A", "D"))?;
    assert!(journeys.is_empty());

    let journeys = build_and_solve(&timetable, &Config::new("20200101T095900", "B", "C"))?;
    assert!(journeys.is_empty());

    let journeys = build_and_solve(&timetable, &Config::new("20200101T095900", "B", "D"))?;
    assert_eq!(journeys.len(), 1);
    assert_eq!(journeys[0].arrival, instant("20200101T101500"));
    Ok(())
}

#[test]
fn allowed_classes_and_bikes() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let timetable = ModelBuilder::default()
        .vj("tram", |vj_builder| {
            vj_builder
                .clasz(Clasz::Tram)
                .st("A", "10:00:00", "10:00:00")
                .st("B", "10:10:00", "10:10:00");
        })
        .vj("bus", |vj_builder| {
            vj_builder
                .st("A", "10:20:00", "10:20:00")
                .st("B", "10:30:00", "10:30:00");
        })
        .vj("bike_bus", |vj_builder| {
            vj_builder
                .bikes_allowed()
                .st("A", "10:40:00", "10:40:00")
                .st("B", "10:50:00", "10:50:00");
        })
        .build()?;

    let config = Config::new("20200101T095900", "A", "B");
    let journeys = build_and_solve(&timetable, &config)?;
    assert_eq!(journeys.len(), 1);
    assert_eq!(transport_names(&timetable, &journeys[0]), vec!["tram"]);

    let mut config = Config::new("20200101T095900", "A", "B");
    config.request_params.allowed_classes = vec![Clasz::Bus];
    let journeys = build_and_solve(&timetable, &config)?;
    assert_eq!(journeys.len(), 1);
    assert_eq!(transport_names(&timetable, &journeys[0]), vec!["bus"]);

    let mut config = Config::new("20200101T095900", "A", "B");
    config.request_params.require_bike_transport = true;
    let journeys = build_and_solve(&timetable, &config)?;
    assert_eq!(journeys.len(), 1);
    assert_eq!(transport_names(&timetable, &journeys[0]), vec!["bike_bus"]);
    Ok(())
}

#[test]
fn journeys_longer_than_allowed_are_discarded() -> Result<(), Error> {
    let _log_guard = init_test_logger();

    let timetable = ModelBuilder::default()
        .vj("toto", |vj_builder| {
            vj_builder
                .st("A", "10:00:00", "10:00:00")
                .st("B", "10:05:00", "10:05:00");
        })
        .build()?;

    let mut config = Config::new("20200101T095900", "A", "B");
    config.request_params.max_journey_duration = PositiveDuration::from_minutes(5);
    let journeys = build_and_solve(&timetable, &config)?;
    assert!(journeys.is_empty());

    config.request_params.max_journey_duration = PositiveDuration::from_minutes(6);
    let journeys = build_and_solve(&timetable, &config)?;
    assert_eq!(journeys.len(), 1);
    Ok(())
}
