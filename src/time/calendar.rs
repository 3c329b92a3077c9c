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

use super::{
    DayIdx, DeltaTime, MinutesAfterMidnight, UnixTime, LOOKBACK_DAYS, MINUTES_IN_DAY,
};
use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz as Timezone;

// the number of days must fit in a day index, and every instant
// of the internal interval must fit in a UnixTime
pub const MAX_DAYS_IN_CALENDAR: u16 = 3 * 366;

static_assertions::const_assert!(
    (MAX_DAYS_IN_CALENDAR as u32) + (LOOKBACK_DAYS as u32) + 1 < (u16::MAX as u32)
);

/// Validity interval of a timetable.
///
/// Days are indexed from `first_date - LOOKBACK_DAYS`, and the calendar
/// covers the internal interval `[first_date - LOOKBACK_DAYS, last_date + 2 days)`,
/// that is every date of `[first_date, last_date]` plus the lookback days
/// and one extra day for trips running past midnight of `last_date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    first_date: NaiveDate, // first date which may be allowed
    last_date: NaiveDate,  // last date (included) which may be allowed
    nb_of_days: u16,       // number of days in the internal interval
}

impl Calendar {
    pub fn new(first_date: NaiveDate, last_date: NaiveDate) -> Self {
        assert!(first_date <= last_date);
        let nb_of_valid_days: i64 = (last_date - first_date).num_days() + 1;
        assert!(
            nb_of_valid_days <= i64::from(MAX_DAYS_IN_CALENDAR),
            "Trying to construct a calendar with {:#} days \
            which is more than the maximum allowed of {:#} days",
            nb_of_valid_days,
            MAX_DAYS_IN_CALENDAR
        );
        // safe because 0 < nb_of_valid_days <= MAX_DAYS_IN_CALENDAR
        // and the const_assert above
        let nb_of_days = nb_of_valid_days as u16 + LOOKBACK_DAYS + 1;
        Self {
            first_date,
            last_date,
            nb_of_days,
        }
    }

    /// Number of days of the internal interval, which is also the
    /// capacity of every traffic day bitfield of this calendar.
    pub fn nb_of_days(&self) -> u16 {
        self.nb_of_days
    }

    pub fn first_date(&self) -> &NaiveDate {
        &self.first_date
    }

    pub fn last_date(&self) -> &NaiveDate {
        &self.last_date
    }

    pub fn days(&self) -> DaysIter {
        DaysIter {
            inner: 0..self.nb_of_days,
        }
    }

    /// Day index of the calendar's first date.
    pub fn first_day(&self) -> DayIdx {
        DayIdx {
            days: LOOKBACK_DAYS,
        }
    }

    fn internal_first_date(&self) -> NaiveDate {
        self.first_date - chrono::Duration::days(i64::from(LOOKBACK_DAYS))
    }

    /// Half-open interval of instants that can be decomposed in
    /// `(day, minutes)` by this calendar.
    pub fn internal_interval(&self) -> (UnixTime, UnixTime) {
        let start = self.day_start(DayIdx { days: 0 });
        let end = UnixTime {
            minutes: start.minutes + i32::from(self.nb_of_days) * MINUTES_IN_DAY,
        };
        (start, end)
    }

    pub fn contains(&self, instant: &UnixTime) -> bool {
        let (start, end) = self.internal_interval();
        start <= *instant && *instant < end
    }

    pub fn contains_date(&self, date: &NaiveDate) -> bool {
        self.first_date <= *date && *date <= self.last_date
    }

    /// Day index of `date`, if it belongs to the internal interval.
    pub fn day_idx(&self, date: &NaiveDate) -> Option<DayIdx> {
        let offset = (*date - self.internal_first_date()).num_days();
        if offset < 0 || offset >= i64::from(self.nb_of_days) {
            None
        } else {
            Some(DayIdx {
                days: offset as u16,
            })
        }
    }

    pub fn to_naive_date(&self, day: &DayIdx) -> NaiveDate {
        self.internal_first_date() + chrono::Duration::days(i64::from(day.days))
    }

    /// The UTC midnight starting `day`.
    pub fn day_start(&self, day: DayIdx) -> UnixTime {
        // the internal first date is always after 1970 for any calendar
        // built from a real feed, and NaiveDate arithmetic keeps us in range
        let midnight = self
            .internal_first_date()
            .and_hms_opt(0, 0, 0)
            .unwrap_or(NaiveDateTime::MIN);
        let first = UnixTime::from_naive_datetime(&midnight).unwrap_or(UnixTime::EPOCH);
        UnixTime {
            minutes: first.minutes + i32::from(day.days) * MINUTES_IN_DAY,
        }
    }

    /// Decomposes `instant` into a day index and the minutes elapsed since
    /// the beginning of that day.
    /// Returns `None` when `instant` is outside of the internal interval.
    pub fn day_idx_mam(&self, instant: &UnixTime) -> Option<(DayIdx, MinutesAfterMidnight)> {
        if !self.contains(instant) {
            return None;
        }
        let start = self.day_start(DayIdx { days: 0 });
        let since_start = instant.minutes - start.minutes;
        let days = since_start.div_euclid(MINUTES_IN_DAY);
        let minutes = since_start.rem_euclid(MINUTES_IN_DAY);
        debug_assert!(days >= 0 && days < i32::from(self.nb_of_days));
        Some((
            DayIdx { days: days as u16 },
            MinutesAfterMidnight {
                minutes: minutes as u16,
            },
        ))
    }

    /// Inverse of `day_idx_mam`, also accepts minutes beyond 24h.
    pub fn to_unixtime(&self, day: DayIdx, minutes: MinutesAfterMidnight) -> UnixTime {
        let day_start = self.day_start(day);
        UnixTime {
            minutes: day_start.minutes + i32::from(minutes.minutes),
        }
    }

    /// Converts an instant to a delta time relative to the midnight of `base_day`.
    pub fn to_delta(&self, base_day: DayIdx, instant: &UnixTime) -> DeltaTime {
        let base = self.day_start(base_day);
        DeltaTime::from_minutes(instant.minutes.saturating_sub(base.minutes))
    }

    /// Converts a delta time relative to the midnight of `base_day` back to an instant.
    pub fn to_instant(&self, base_day: DayIdx, delta: DeltaTime) -> Option<UnixTime> {
        let minutes = delta.get()?;
        let base = self.day_start(base_day);
        Some(UnixTime {
            minutes: base.minutes + i32::from(minutes),
        })
    }

    /// Delta time of an event happening `minutes` after the midnight of `day`,
    /// relative to the midnight of `base_day`.
    pub fn event_delta(
        &self,
        base_day: DayIdx,
        day: DayIdx,
        minutes: MinutesAfterMidnight,
    ) -> DeltaTime {
        let days = day.days_since(&base_day);
        DeltaTime::from_minutes(days * MINUTES_IN_DAY + i32::from(minutes.minutes))
    }

    pub fn to_local_datetime(&self, instant: &UnixTime, timezone: &Timezone) -> NaiveDateTime {
        use chrono::TimeZone;
        let utc = instant.to_naive_datetime();
        timezone.from_utc_datetime(&utc).naive_local()
    }

    pub fn to_pretty_string(&self, instant: &UnixTime) -> String {
        instant.to_naive_datetime().format("%H:%M %d-%b-%y").to_string()
    }
}

pub struct DaysIter {
    inner: std::ops::Range<u16>,
}

impl Iterator for DaysIter {
    type Item = DayIdx;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|days| DayIdx { days })
    }
}
