use railbook_order::BookingDesk;

/// The train picked after the last search, with the segment it was searched for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub train_id: String,
    pub source: String,
    pub destination: String,
}

pub struct AppState {
    pub desk: BookingDesk,
    pub selection: Option<Selection>,
}

impl AppState {
    pub fn new(desk: BookingDesk) -> Self {
        Self { desk, selection: None }
    }
}
