use std::collections::HashMap;

use crate::time::{Calendar, DayIdx};
use crate::transit_data::idx::BitfieldIdx;
use chrono::NaiveDate;
use fixedbitset::FixedBitSet;

/// Set of days on which a transport runs, one bit per day index of a calendar.
///
/// The capacity is fixed at construction, and bits beyond it can never be set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bitfield {
    days: FixedBitSet,
}

impl Bitfield {
    pub fn empty(calendar: &Calendar) -> Self {
        Self {
            days: FixedBitSet::with_capacity(usize::from(calendar.nb_of_days())),
        }
    }

    /// Dates outside of the calendar's internal interval are ignored.
    pub fn from_dates<'a, Dates>(dates: Dates, calendar: &Calendar) -> Self
    where
        Dates: IntoIterator<Item = &'a NaiveDate>,
    {
        let mut bitfield = Self::empty(calendar);
        for date in dates {
            if let Some(day) = calendar.day_idx(date) {
                bitfield.days.insert(day.idx());
            }
        }
        bitfield
    }

    /// Returns `false` and leaves the bitfield untouched when `day`
    /// is beyond its capacity.
    pub fn insert(&mut self, day: DayIdx) -> bool {
        if day.idx() < self.days.len() {
            self.days.insert(day.idx());
            true
        } else {
            false
        }
    }

    pub fn contains(&self, day: DayIdx) -> bool {
        // FixedBitSet::contains is false beyond the capacity
        self.days.contains(day.idx())
    }

    pub fn capacity(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.count_ones(..) == 0
    }

    pub fn days(&self) -> impl Iterator<Item = DayIdx> + '_ {
        self.days.ones().map(|idx| DayIdx::new(idx as u16))
    }

    /// A copy of this bitfield where every day is moved `offset` days later.
    /// Days moved beyond the capacity are dropped.
    pub fn shifted(&self, offset: u16) -> Self {
        let mut days = FixedBitSet::with_capacity(self.days.len());
        let offset = usize::from(offset);
        for idx in self.days.ones() {
            if idx + offset < days.len() {
                days.insert(idx + offset);
            }
        }
        Self { days }
    }
}

/// Interned storage of bitfields : equal bitfields share the same index.
#[derive(Debug, Default)]
pub struct Bitfields {
    bitfields: Vec<Bitfield>,
    index: HashMap<Bitfield, BitfieldIdx>,
}

impl Bitfields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert(&mut self, bitfield: Bitfield) -> BitfieldIdx {
        if let Some(idx) = self.index.get(&bitfield) {
            return *idx;
        }
        let idx = BitfieldIdx::new(self.bitfields.len());
        self.bitfields.push(bitfield.clone());
        self.index.insert(bitfield, idx);
        idx
    }

    pub fn get(&self, idx: BitfieldIdx) -> Option<&Bitfield> {
        self.bitfields.get(idx.idx())
    }

    pub fn len(&self) -> usize {
        self.bitfields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bitfields.is_empty()
    }

    pub(crate) fn into_vec(self) -> Vec<Bitfield> {
        self.bitfields
    }
}
