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

pub mod bitfield;
pub mod calendar;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

pub use bitfield::Bitfield;
pub use calendar::Calendar;

pub const MINUTES_IN_DAY: i32 = 24 * 60;

/// Number of days before the first date of the calendar that are still
/// addressable by a day index, so that trips running "before midnight"
/// of the first valid day can be represented.
pub const LOOKBACK_DAYS: u16 = 5;

/// Events of a transport are expressed in minutes after the midnight of
/// its service day, and must happen within this many days.
pub const MAX_DAYS_IN_TRIP: u16 = 5;

pub const MAX_MINUTES_AFTER_MIDNIGHT: u16 = MAX_DAYS_IN_TRIP * (MINUTES_IN_DAY as u16);

// a delta time spans at most the lookback days plus a whole trip, and must
// stay below the infeasible sentinel
static_assertions::const_assert!(
    (LOOKBACK_DAYS as i32 + MAX_DAYS_IN_TRIP as i32 + 1) * MINUTES_IN_DAY < i16::MAX as i32
);

/// An absolute instant, in minutes since 1970-01-01T00:00:00 UTC.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Ord, PartialOrd, Hash)]
pub struct UnixTime {
    pub(crate) minutes: i32,
}

/// Number of days since `first_date - LOOKBACK_DAYS` of a calendar.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Ord, PartialOrd, Hash)]
pub struct DayIdx {
    pub(crate) days: u16,
}

/// Time of an event, counted from the midnight of the day the transport
/// is running on. May exceed 24h for trips running past midnight.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Ord, PartialOrd, Hash)]
pub struct MinutesAfterMidnight {
    pub(crate) minutes: u16,
}

/// A signed minute offset relative to the midnight of a reference day.
///
/// The value `DeltaTime::INFEASIBLE` stands for "unreachable".
/// It compares greater than every finite value and is absorbing for
/// every arithmetic operation.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Ord, PartialOrd, Hash)]
pub struct DeltaTime {
    minutes: i16,
}

#[derive(Debug, Eq, PartialEq, Clone, Copy, Ord, PartialOrd, Hash)]
pub struct PositiveDuration {
    pub(crate) minutes: u16,
}

/// Direction of a search, and of every comparison made during it.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// departing no earlier than the query instant, minimizing arrival
    Forward,
    /// arriving no later than the query instant, maximizing departure
    Backward,
}

impl UnixTime {
    pub const EPOCH: UnixTime = UnixTime { minutes: 0 };

    pub fn from_minutes(minutes: i32) -> Self {
        Self { minutes }
    }

    pub fn minutes(&self) -> i32 {
        self.minutes
    }

    // instants are truncated to the minute
    pub fn from_naive_datetime(datetime: &NaiveDateTime) -> Option<Self> {
        let seconds = Utc.from_utc_datetime(datetime).timestamp();
        let minutes = seconds.div_euclid(60);
        i32::try_from(minutes).ok().map(|minutes| Self { minutes })
    }

    pub fn to_naive_datetime(&self) -> NaiveDateTime {
        let seconds = i64::from(self.minutes) * 60;
        DateTime::<Utc>::from_timestamp(seconds, 0)
            .map(|datetime| datetime.naive_utc())
            .unwrap_or(NaiveDateTime::MIN)
    }

    pub fn saturating_add(self, duration: PositiveDuration) -> Self {
        Self {
            minutes: self.minutes.saturating_add(i32::from(duration.minutes)),
        }
    }

    pub fn saturating_sub(self, duration: PositiveDuration) -> Self {
        Self {
            minutes: self.minutes.saturating_sub(i32::from(duration.minutes)),
        }
    }

    pub fn duration_since(&self, earlier: &UnixTime) -> Option<PositiveDuration> {
        let minutes = self.minutes.checked_sub(earlier.minutes)?;
        PositiveDuration::from_minutes_i32(minutes)
    }
}

impl Display for UnixTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_naive_datetime().format("%Y-%m-%d %H:%M"))
    }
}

impl DayIdx {
    pub fn new(days: u16) -> Self {
        Self { days }
    }

    pub fn idx(&self) -> usize {
        usize::from(self.days)
    }

    pub fn checked_add(&self, days: i32) -> Option<DayIdx> {
        let days = i32::from(self.days).checked_add(days)?;
        u16::try_from(days).ok().map(|days| DayIdx { days })
    }

    /// signed number of days from `other` to `self`
    pub fn days_since(&self, other: &DayIdx) -> i32 {
        i32::from(self.days) - i32::from(other.days)
    }
}

impl Display for DayIdx {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "day {}", self.days)
    }
}

impl MinutesAfterMidnight {
    pub fn zero() -> Self {
        Self { minutes: 0 }
    }

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        if minutes >= MAX_MINUTES_AFTER_MIDNIGHT {
            None
        } else {
            Some(Self { minutes })
        }
    }

    pub const fn from_hm(hours: u16, minutes: u16) -> Self {
        Self {
            minutes: hours * 60 + minutes,
        }
    }

    pub fn minutes(&self) -> u16 {
        self.minutes
    }

    /// number of whole days contained in this time
    pub fn days(&self) -> u16 {
        self.minutes / (MINUTES_IN_DAY as u16)
    }
}

impl Display for MinutesAfterMidnight {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unable to parse `{input}` as a time. Expected format is HH:MM or HH:MM:SS")]
pub struct TimeParseError {
    input: String,
}

// "HH:MM" or "HH:MM:SS", seconds are truncated
fn parse_hms_minutes(s: &str) -> Result<u32, TimeParseError> {
    let err = || TimeParseError {
        input: s.to_string(),
    };
    let mut fields = s.trim().split(':');
    let hours: u32 = fields.next().ok_or_else(err)?.parse().map_err(|_| err())?;
    let minutes: u32 = fields.next().ok_or_else(err)?.parse().map_err(|_| err())?;
    if let Some(seconds) = fields.next() {
        let seconds: u32 = seconds.parse().map_err(|_| err())?;
        if seconds >= 60 {
            return Err(err());
        }
    }
    if fields.next().is_some() || minutes >= 60 {
        return Err(err());
    }
    Ok(hours * 60 + minutes)
}

impl FromStr for MinutesAfterMidnight {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minutes = parse_hms_minutes(s)?;
        u16::try_from(minutes)
            .ok()
            .and_then(MinutesAfterMidnight::from_minutes)
            .ok_or_else(|| TimeParseError {
                input: s.to_string(),
            })
    }
}

impl DeltaTime {
    pub const INFEASIBLE: DeltaTime = DeltaTime { minutes: i16::MAX };

    pub const ZERO: DeltaTime = DeltaTime { minutes: 0 };

    /// Values that do not fit in the representable range become `INFEASIBLE`.
    pub fn from_minutes(minutes: i32) -> Self {
        if minutes >= i32::from(i16::MAX) || minutes <= i32::from(i16::MIN) {
            Self::INFEASIBLE
        } else {
            Self {
                minutes: minutes as i16,
            }
        }
    }

    pub fn is_feasible(&self) -> bool {
        *self != Self::INFEASIBLE
    }

    pub fn get(&self) -> Option<i16> {
        if self.is_feasible() {
            Some(self.minutes)
        } else {
            None
        }
    }

    pub fn saturating_add(self, duration: PositiveDuration) -> Self {
        if !self.is_feasible() || !duration.is_feasible() {
            return Self::INFEASIBLE;
        }
        Self::from_minutes(i32::from(self.minutes) + i32::from(duration.minutes))
    }

    pub fn saturating_sub(self, duration: PositiveDuration) -> Self {
        if !self.is_feasible() || !duration.is_feasible() {
            return Self::INFEASIBLE;
        }
        Self::from_minutes(i32::from(self.minutes) - i32::from(duration.minutes))
    }

    /// Minutes elapsed from `self` to `later`, `None` when any side is
    /// infeasible or `later` comes before `self`.
    pub fn duration_until(&self, later: &DeltaTime) -> Option<PositiveDuration> {
        let from = self.get()?;
        let to = later.get()?;
        PositiveDuration::from_minutes_i32(i32::from(to) - i32::from(from))
    }
}

impl Display for DeltaTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.get() {
            Some(minutes) => {
                let days = i32::from(minutes).div_euclid(MINUTES_IN_DAY);
                let in_day = i32::from(minutes).rem_euclid(MINUTES_IN_DAY);
                write!(f, "{}d{:02}:{:02}", days, in_day / 60, in_day % 60)
            }
            None => write!(f, "infeasible"),
        }
    }
}

impl PositiveDuration {
    /// Reserved value of durations that cannot be used.
    pub const MAX: PositiveDuration = PositiveDuration { minutes: u16::MAX };

    pub fn zero() -> Self {
        Self { minutes: 0 }
    }

    pub const fn from_hm(hours: u16, minutes: u16) -> Self {
        Self {
            minutes: hours * 60 + minutes,
        }
    }

    pub const fn from_minutes(minutes: u16) -> Self {
        Self { minutes }
    }

    pub fn from_minutes_i32(minutes: i32) -> Option<Self> {
        u16::try_from(minutes).ok().map(|minutes| Self { minutes })
    }

    pub fn total_minutes(&self) -> u16 {
        self.minutes
    }

    pub fn is_feasible(&self) -> bool {
        *self != Self::MAX
    }

    pub fn saturating_add(self, rhs: Self) -> Self {
        Self {
            minutes: self.minutes.saturating_add(rhs.minutes),
        }
    }
}

impl Display for PositiveDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let hours = self.minutes / 60;
        let minutes = self.minutes % 60;
        if hours != 0 {
            write!(f, "{}h{:02}m", hours, minutes)
        } else {
            write!(f, "{}m", minutes)
        }
    }
}

impl std::ops::Add for PositiveDuration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        self.saturating_add(rhs)
    }
}

impl std::ops::Mul<u16> for PositiveDuration {
    type Output = Self;

    fn mul(self, rhs: u16) -> Self::Output {
        PositiveDuration {
            minutes: self.minutes.saturating_mul(rhs),
        }
    }
}

impl FromStr for PositiveDuration {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minutes = parse_hms_minutes(s)?;
        u16::try_from(minutes)
            .ok()
            .filter(|minutes| *minutes != u16::MAX)
            .map(PositiveDuration::from_minutes)
            .ok_or_else(|| TimeParseError {
                input: s.to_string(),
            })
    }
}

impl Serialize for PositiveDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let text = format!("{:02}:{:02}:00", self.minutes / 60, self.minutes % 60);
        serializer.serialize_str(&text)
    }
}

impl<'de> Deserialize<'de> for PositiveDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        PositiveDuration::from_str(&text).map_err(serde::de::Error::custom)
    }
}

impl Direction {
    pub fn is_forward(&self) -> bool {
        matches!(self, Direction::Forward)
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    /// The "worst" possible time in this direction.
    pub fn unreachable(&self) -> DeltaTime {
        DeltaTime::INFEASIBLE
    }

    /// Is `lhs` strictly better than `rhs` ? An infeasible value is never better.
    pub fn is_better(&self, lhs: DeltaTime, rhs: DeltaTime) -> bool {
        if !lhs.is_feasible() {
            return false;
        }
        if !rhs.is_feasible() {
            return true;
        }
        match self {
            Direction::Forward => lhs < rhs,
            Direction::Backward => lhs > rhs,
        }
    }

    pub fn is_better_or_eq(&self, lhs: DeltaTime, rhs: DeltaTime) -> bool {
        lhs == rhs || self.is_better(lhs, rhs)
    }

    pub fn best(&self, lhs: DeltaTime, rhs: DeltaTime) -> DeltaTime {
        if self.is_better(rhs, lhs) {
            rhs
        } else {
            lhs
        }
    }

    /// Moves `time` by `duration` in the direction of the search.
    pub fn add(&self, time: DeltaTime, duration: PositiveDuration) -> DeltaTime {
        match self {
            Direction::Forward => time.saturating_add(duration),
            Direction::Backward => time.saturating_sub(duration),
        }
    }

    pub fn add_unix(&self, time: UnixTime, duration: PositiveDuration) -> UnixTime {
        match self {
            Direction::Forward => time.saturating_add(duration),
            Direction::Backward => time.saturating_sub(duration),
        }
    }

    /// Is `lhs` strictly better than `rhs`, for absolute instants ?
    pub fn is_better_unix(&self, lhs: UnixTime, rhs: UnixTime) -> bool {
        match self {
            Direction::Forward => lhs < rhs,
            Direction::Backward => lhs > rhs,
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}
