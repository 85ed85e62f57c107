//! Station records as delivered by the station-data service.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time-series code carried by a station feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesCode {
    /// Observed water level
    Wlo,
    /// Astronomical (tidal) prediction
    Wlp,
    /// Quality-controlled forecast
    Wlf,
    /// SPINE forecast
    Spine,
    /// Observed surface current speed
    Wcs,
    /// Observed surface current direction
    Wcd,
}

impl SeriesCode {
    pub const ALL: [SeriesCode; 6] = [
        SeriesCode::Wlo,
        SeriesCode::Wlp,
        SeriesCode::Wlf,
        SeriesCode::Spine,
        SeriesCode::Wcs,
        SeriesCode::Wcd,
    ];

    /// Key used for this series in station feature properties.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wlo => "wlo",
            Self::Wlp => "wlp",
            Self::Wlf => "wlf",
            Self::Spine => "spine",
            Self::Wcs => "wcs",
            Self::Wcd => "wcd",
        }
    }

    /// Parse a property key. Unknown keys yield `None`.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.as_str() == key)
    }
}

impl fmt::Display for SeriesCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identification and location of a station.
///
/// Travels with every assembled column so the writer can recover code,
/// name and position without re-deriving them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationHeader {
    /// Fixed-width station code (e.g. "07795")
    pub code: String,
    /// Official station name
    pub name: String,
    /// Latitude in WGS84 degrees
    pub latitude: f64,
    /// Longitude in WGS84 degrees
    pub longitude: f64,
}

impl StationHeader {
    pub fn new(
        code: impl Into<String>,
        name: impl Into<String>,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// Ordered `(timestamp, value)` samples.
pub type TimeSeries = Vec<(DateTime<Utc>, f64)>;

/// A station and all of its fetched series.
///
/// Immutable once built; series are kept sorted by timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRecord {
    pub header: StationHeader,
    series: BTreeMap<SeriesCode, TimeSeries>,
}

impl StationRecord {
    pub fn new(header: StationHeader) -> Self {
        Self {
            header,
            series: BTreeMap::new(),
        }
    }

    /// Attach a series, replacing any previous one with the same code.
    pub fn with_series(mut self, code: SeriesCode, mut samples: TimeSeries) -> Self {
        samples.sort_by_key(|(time, _)| *time);
        self.series.insert(code, samples);
        self
    }

    /// Samples for `code`; empty when the station has no such series.
    pub fn series(&self, code: SeriesCode) -> &[(DateTime<Utc>, f64)] {
        self.series.get(&code).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether the station carries at least one sample for `code`.
    pub fn has_series(&self, code: SeriesCode) -> bool {
        !self.series(code).is_empty()
    }

    pub fn code(&self) -> &str {
        &self.header.code
    }

    pub fn latitude(&self) -> f64 {
        self.header.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.header.longitude
    }
}
