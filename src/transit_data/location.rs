use std::collections::HashMap;

use chrono_tz::Tz as Timezone;

use super::idx::{LocationIdx, SourceIdx};
use super::vecvec::VecVec;
use crate::time::PositiveDuration;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationId {
    pub source: SourceIdx,
    pub id: String,
}

impl LocationId {
    pub fn new(source: SourceIdx, id: &str) -> Self {
        Self {
            source,
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for LocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.source.idx(), self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationType {
    /// a platform generated by the loader
    GeneratedTrack,
    Track,
    #[default]
    Station,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A location to be registered in a `TimetableBuilder`.
#[derive(Debug, Clone)]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    pub coordinates: Coordinates,
    pub location_type: LocationType,
    pub parent: Option<LocationIdx>,
    pub timezone: Option<Timezone>,
    /// minimum time needed to change vehicles at this location
    pub transfer_time: PositiveDuration,
}

impl Location {
    pub fn new(id: LocationId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            coordinates: Coordinates::default(),
            location_type: LocationType::default(),
            parent: None,
            timezone: None,
            transfer_time: PositiveDuration::zero(),
        }
    }
}

/// All locations of a timetable, stored by attribute.
#[derive(Debug, Default)]
pub struct Locations {
    ids: Vec<LocationId>,
    names: Vec<String>,
    coordinates: Vec<Coordinates>,
    types: Vec<LocationType>,
    parents: Vec<Option<LocationIdx>>,
    children: VecVec<LocationIdx, LocationIdx>,
    timezones: Vec<Option<Timezone>>,
    transfer_times: Vec<PositiveDuration>,
    location_id_to_idx: HashMap<LocationId, LocationIdx>,
}

impl Locations {
    /// Registers `location` and returns its index.
    /// When a location with the same id already exists, nothing is
    /// registered and `Err` carries the index of the existing one.
    pub(crate) fn register(&mut self, location: Location) -> Result<LocationIdx, LocationIdx> {
        if let Some(existing) = self.location_id_to_idx.get(&location.id) {
            return Err(*existing);
        }
        let idx = LocationIdx::new(self.ids.len());
        self.location_id_to_idx.insert(location.id.clone(), idx);
        self.ids.push(location.id);
        self.names.push(location.name);
        self.coordinates.push(location.coordinates);
        self.types.push(location.location_type);
        self.parents.push(location.parent);
        self.timezones.push(location.timezone);
        self.transfer_times.push(location.transfer_time);
        Ok(idx)
    }

    /// Returns the first registered location whose parent does not exist.
    pub(crate) fn dangling_parent(&self) -> Option<(LocationIdx, LocationIdx)> {
        self.parents
            .iter()
            .enumerate()
            .find_map(|(idx, parent)| match parent {
                Some(parent) if parent.idx() >= self.len() => {
                    Some((LocationIdx::new(idx), *parent))
                }
                _ => None,
            })
    }

    pub(crate) fn compute_children(&mut self) {
        let entries = self
            .parents
            .iter()
            .enumerate()
            .filter_map(|(idx, parent)| parent.map(|parent| (parent, LocationIdx::new(idx))))
            .collect();
        self.children = VecVec::from_keyed(self.len(), entries);
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn find(&self, id: &LocationId) -> Option<LocationIdx> {
        self.location_id_to_idx.get(id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = LocationIdx> {
        (0..self.len()).map(LocationIdx::new)
    }

    pub fn id(&self, location: LocationIdx) -> &LocationId {
        &self.ids[location.idx()]
    }

    pub fn name(&self, location: LocationIdx) -> &str {
        &self.names[location.idx()]
    }

    pub fn coordinates(&self, location: LocationIdx) -> Coordinates {
        self.coordinates[location.idx()]
    }

    pub fn location_type(&self, location: LocationIdx) -> LocationType {
        self.types[location.idx()]
    }

    pub fn parent(&self, location: LocationIdx) -> Option<LocationIdx> {
        self.parents[location.idx()]
    }

    pub fn children(&self, location: LocationIdx) -> &[LocationIdx] {
        self.children.get(location).unwrap_or(&[])
    }

    /// The timezone of the location, or of its parent when not set.
    pub fn timezone(&self, location: LocationIdx) -> Option<Timezone> {
        self.timezones[location.idx()]
            .or_else(|| self.parent(location).and_then(|parent| self.timezones[parent.idx()]))
    }

    pub fn transfer_time(&self, location: LocationIdx) -> PositiveDuration {
        self.transfer_times[location.idx()]
    }
}
