use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Occupancy of a single seat. Persisted as `0` (free) or `1` (booked).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeatState {
    #[default]
    Free,
    Booked,
}

impl SeatState {
    pub fn as_flag(self) -> u8 {
        match self {
            SeatState::Free => 0,
            SeatState::Booked => 1,
        }
    }

    pub fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            0 => Some(SeatState::Free),
            1 => Some(SeatState::Booked),
            _ => None,
        }
    }
}

impl Serialize for SeatState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u8(self.as_flag())
    }
}

impl<'de> Deserialize<'de> for SeatState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let flag = u8::deserialize(deserializer)?;
        SeatState::from_flag(flag).ok_or_else(|| {
            de::Error::custom(format!("invalid seat flag {}, expected 0 or 1", flag))
        })
    }
}

impl fmt::Display for SeatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_flag())
    }
}

/// Zero-based seat coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatPosition {
    pub row: usize,
    pub col: usize,
}

impl SeatPosition {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for SeatPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shown the way riders enter it: 1-based.
        write!(f, "row {} seat {}", self.row + 1, self.col + 1)
    }
}

/// Row-major seat occupancy for one train. Rows may differ in width.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatGrid {
    rows: Vec<Vec<SeatState>>,
}

impl SeatGrid {
    pub fn new(rows: Vec<Vec<SeatState>>) -> Self {
        Self { rows }
    }

    /// A grid of `row_count` rows with `width` free seats each.
    pub fn with_dimensions(row_count: usize, width: usize) -> Self {
        Self {
            rows: vec![vec![SeatState::Free; width]; row_count],
        }
    }

    /// Builds a grid from raw occupancy flags, rejecting anything other than 0 or 1.
    pub fn from_flags(flags: Vec<Vec<u8>>) -> Result<Self, SeatError> {
        let rows = flags
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|flag| SeatState::from_flag(flag).ok_or(SeatError::InvalidFlag(flag)))
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rows })
    }

    pub fn to_flags(&self) -> Vec<Vec<u8>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|seat| seat.as_flag()).collect())
            .collect()
    }

    pub fn rows(&self) -> &[Vec<SeatState>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row_width(&self, row: usize) -> Option<usize> {
        self.rows.get(row).map(Vec::len)
    }

    pub fn get(&self, position: SeatPosition) -> Option<SeatState> {
        self.rows
            .get(position.row)
            .and_then(|row| row.get(position.col))
            .copied()
    }


    pub fn available_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|seat| **seat == SeatState::Free)
            .count()
    }

    /// Check-and-set: turns a free seat into a booked one.
    ///
    /// The grid is left untouched when the position is out of range or the seat is already taken.
    pub fn claim(&mut self, position: SeatPosition) -> Result<(), SeatError> {
        let seat = self.seat_mut(position)?;
        if *seat == SeatState::Booked {
            return Err(SeatError::AlreadyBooked(position));
        }
        *seat = SeatState::Booked;
        Ok(())
    }

    /// Inverse of [`SeatGrid::claim`].
    pub fn release(&mut self, position: SeatPosition) -> Result<(), SeatError> {
        let seat = self.seat_mut(position)?;
        if *seat == SeatState::Free {
            return Err(SeatError::NotBooked(position));
        }
        *seat = SeatState::Free;
        Ok(())
    }

    fn seat_mut(&mut self, position: SeatPosition) -> Result<&mut SeatState, SeatError> {
        self.rows
            .get_mut(position.row)
            .and_then(|row| row.get_mut(position.col))
            .ok_or(SeatError::InvalidSelection(position))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeatError {
    #[error("Invalid seat selection: {0}")]
    InvalidSelection(SeatPosition),

    #[error("Seat already booked: {0}")]
    AlreadyBooked(SeatPosition),

    #[error("Seat is not booked: {0}")]
    NotBooked(SeatPosition),

    #[error("Invalid seat flag {0}, expected 0 or 1")]
    InvalidFlag(u8),
}
