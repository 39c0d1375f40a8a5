/// Emitted after a seat claim has been persisted together with its ticket.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SeatBookedEvent {
    pub ticket_id: String,
    pub user_id: String,
    pub train_id: String,
    pub row: usize,
    pub col: usize,
    pub source: String,
    pub destination: String,
    pub timestamp: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct TicketCancelledEvent {
    pub ticket_id: String,
    pub user_id: String,
    pub train_id: String,
    pub seat_released: bool,
    pub timestamp: i64,
}
