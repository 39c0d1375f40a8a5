use chrono::{DateTime, Utc};
use railbook_catalog::{SeatPosition, Train};
use railbook_shared::Masked;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A registered rider and the tickets they hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    /// Stored as entered; masked in logs
    #[serde(default)]
    pub password: Masked<String>,
    pub hashed_password: String,
    #[serde(default)]
    pub tickets_booked: Vec<Ticket>,
    pub user_id: String,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        password: impl Into<String>,
        hashed_password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            password: Masked::new(password.into()),
            hashed_password: hashed_password.into(),
            tickets_booked: Vec::new(),
            user_id: Uuid::new_v4().to_string(),
        }
    }

    /// Display names are unique ignoring case.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }
}

/// The travel segment a rider asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journey {
    pub source: String,
    pub destination: String,
    /// Opaque; only required to be non-empty
    pub date_of_travel: String,
}

impl Journey {
    pub fn new(
        source: impl Into<String>,
        destination: impl Into<String>,
        date_of_travel: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            date_of_travel: date_of_travel.into(),
        }
    }
}

/// A booked seat, with a copy of the train as it was when the seat was claimed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub ticket_id: String,
    pub user_id: String,
    pub source: String,
    pub destination: String,
    pub date_of_travel: String,
    pub train: Train,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat: Option<SeatPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booked_at: Option<DateTime<Utc>>,
}

impl Ticket {
    pub fn issue(
        user_id: impl Into<String>,
        journey: &Journey,
        train: &Train,
        seat: SeatPosition,
    ) -> Self {
        Self {
            ticket_id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            source: journey.source.clone(),
            destination: journey.destination.clone(),
            date_of_travel: journey.date_of_travel.clone(),
            train: train.clone(),
            seat: Some(seat),
            booked_at: Some(Utc::now()),
        }
    }
}

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Ticket ID: {} belongs to User {} from {} to {} on {} (train {}",
            self.ticket_id,
            self.user_id,
            self.source,
            self.destination,
            self.date_of_travel,
            self.train.train_no
        )?;
        if let Some(seat) = self.seat {
            write!(f, ", {}", seat)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use railbook_catalog::SeatGrid;

    #[test]
    fn test_ticket_owns_its_train_snapshot() {
        let mut train = Train::new("T1", "100")
            .with_station("a", "09:00")
            .with_station("b", "10:00")
            .with_seats(SeatGrid::with_dimensions(1, 2));
        let journey = Journey::new("a", "b", "2024-05-01T09:00:00Z");

        let ticket = Ticket::issue("u-1", &journey, &train, SeatPosition::new(0, 0));
        train.seats.claim(SeatPosition::new(0, 1)).unwrap();

        assert_eq!(ticket.train.seats.available_count(), 2);
        assert_eq!(train.seats.available_count(), 1);
    }

    #[test]
    fn test_legacy_user_document_parses() {
        let json = r#"{
            "name": "alice",
            "password": "pw",
            "hashedPassword": "$argon2id$x",
            "ticketsBooked": [{
                "ticketId": "t-1",
                "userId": "u-1",
                "source": "bangalore",
                "destination": "delhi",
                "dateOfTravel": "2023-12-08T18:30:00Z",
                "train": {"trainId": "T1", "trainNo": "1", "stations": ["bangalore", "delhi"],
                          "stationTimes": {"bangalore": "08:00"}, "seats": [[1]]}
            }],
            "userId": "u-1"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();

        assert_eq!(user.password.expose(), "pw");
        assert_eq!(user.tickets_booked.len(), 1);
        assert_eq!(user.tickets_booked[0].seat, None);
        assert_eq!(user.tickets_booked[0].ticket_id, "t-1");

        // Optional fields stay out of the document when absent
        let value = serde_json::to_value(&user).unwrap();
        assert!(value["ticketsBooked"][0].get("seat").is_none());
        assert!(value["ticketsBooked"][0].get("bookedAt").is_none());
    }

    #[test]
    fn test_user_debug_masks_password() {
        let user = User::new("bob", "hunter2", "$argon2id$y");
        assert!(!format!("{:?}", user).contains("hunter2"));
        assert!(user.has_name("BOB"));
    }
}
