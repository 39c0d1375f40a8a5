use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::seats::SeatGrid;

/// A train with its ordered route and seat occupancy.
///
/// Field names follow the camelCase keys of the train document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Train {
    pub train_id: String,
    pub train_no: String,
    /// Station names in traversal order
    #[serde(default)]
    pub stations: Vec<String>,
    /// Scheduled time per station, in document order
    #[serde(default)]
    pub station_times: IndexMap<String, String>,
    #[serde(default)]
    pub seats: SeatGrid,
}

impl Train {
    pub fn new(train_id: impl Into<String>, train_no: impl Into<String>) -> Self {
        Self {
            train_id: train_id.into(),
            train_no: train_no.into(),
            stations: Vec::new(),
            station_times: IndexMap::new(),
            seats: SeatGrid::default(),
        }
    }

    /// Appends a stop; names are stored lowercase.
    pub fn with_station(mut self, name: &str, time: impl Into<String>) -> Self {
        let name = name.to_lowercase();
        self.station_times.insert(name.clone(), time.into());
        self.stations.push(name);
        self
    }

    pub fn with_seats(mut self, seats: SeatGrid) -> Self {
        self.seats = seats;
        self
    }

    /// First position of `station` in the route, ignoring case.
    pub fn station_index(&self, station: &str) -> Option<usize> {
        let wanted = station.to_lowercase();
        self.stations
            .iter()
            .position(|candidate| candidate.to_lowercase() == wanted)
    }

    /// Train identifiers are matched case-insensitively.
    pub fn has_id(&self, train_id: &str) -> bool {
        self.train_id.to_lowercase() == train_id.to_lowercase()
    }
}
