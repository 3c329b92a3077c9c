extern crate static_assertions;

pub mod engine;
pub mod footpath;
pub mod request;
pub mod response;
pub mod time;
pub mod transit_data;

pub use chrono;
pub use chrono::{NaiveDate, NaiveDateTime};
pub use chrono_tz;
pub use tracing;

pub use engine::{solve, Raptor, RaptorState};
pub use request::{BadRequest, Offset, Query, StartTime, ViaStop};
pub use response::{Journey, Leg, LegKind};
pub use time::{Calendar, DeltaTime, Direction, PositiveDuration, UnixTime};
pub use transit_data::{Timetable, TimetableBuilder, TimetableError};
