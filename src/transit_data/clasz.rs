use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Class of service of a section of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clasz {
    Air,
    HighSpeed,
    LongDistance,
    Coach,
    Night,
    RegionalFast,
    Regional,
    Metro,
    Subway,
    Tram,
    Bus,
    Ship,
    Other,
}

pub const NB_OF_CLASSES: usize = 13;

pub const ALL_CLASSES: [Clasz; NB_OF_CLASSES] = [
    Clasz::Air,
    Clasz::HighSpeed,
    Clasz::LongDistance,
    Clasz::Coach,
    Clasz::Night,
    Clasz::RegionalFast,
    Clasz::Regional,
    Clasz::Metro,
    Clasz::Subway,
    Clasz::Tram,
    Clasz::Bus,
    Clasz::Ship,
    Clasz::Other,
];

static_assertions::const_assert!(NB_OF_CLASSES <= 16);

impl Clasz {
    fn bit(&self) -> u16 {
        1 << (*self as u16)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Clasz::Air => "air",
            Clasz::HighSpeed => "high_speed",
            Clasz::LongDistance => "long_distance",
            Clasz::Coach => "coach",
            Clasz::Night => "night",
            Clasz::RegionalFast => "regional_fast",
            Clasz::Regional => "regional",
            Clasz::Metro => "metro",
            Clasz::Subway => "subway",
            Clasz::Tram => "tram",
            Clasz::Bus => "bus",
            Clasz::Ship => "ship",
            Clasz::Other => "other",
        }
    }
}

impl std::fmt::Display for Clasz {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug)]
pub struct ClaszConfigError {
    clasz_name: String,
}

impl std::error::Error for ClaszConfigError {}

impl std::fmt::Display for ClaszConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bad clasz : `{}`", self.clasz_name)
    }
}

impl FromStr for Clasz {
    type Err = ClaszConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_CLASSES
            .iter()
            .find(|clasz| clasz.as_str() == s)
            .copied()
            .ok_or_else(|| ClaszConfigError {
                clasz_name: s.to_string(),
            })
    }
}

/// A set of allowed classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaszMask {
    mask: u16,
}

impl ClaszMask {
    pub fn all() -> Self {
        Self {
            mask: (1 << NB_OF_CLASSES) - 1,
        }
    }

    pub fn none() -> Self {
        Self { mask: 0 }
    }

    pub fn with(mut self, clasz: Clasz) -> Self {
        self.mask |= clasz.bit();
        self
    }

    pub fn contains(&self, clasz: Clasz) -> bool {
        self.mask & clasz.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.mask == 0
    }
}

impl Default for ClaszMask {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<Clasz> for ClaszMask {
    fn from_iter<T: IntoIterator<Item = Clasz>>(iter: T) -> Self {
        iter.into_iter().fold(ClaszMask::none(), ClaszMask::with)
    }
}
