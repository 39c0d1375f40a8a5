use std::sync::Arc;

use chrono::Utc;
use railbook_catalog::{SeatError, SeatGrid, SeatPosition, Train};
use railbook_core::{CoreResult, CredentialHasher, Repository, Session, TrainDirectory};
use railbook_shared::models::{SeatBookedEvent, TicketCancelledEvent};
use serde::Serialize;
use tracing::{info, warn};

use crate::ledger::UserLedger;
use crate::models::{Journey, Ticket, User};

/// Result of a business operation: `Err` carries a recoverable, user-facing reason.
pub type Outcome<T> = Result<T, Rejection>;

/// What cancelling a ticket does to the seat it held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CancellationPolicy {
    /// The seat stays booked on the train; only the ticket goes away.
    #[default]
    KeepSeat,
    /// The seat recorded on the ticket is freed again.
    ReleaseSeat,
}

impl CancellationPolicy {
    pub fn from_release_flag(release_seat_on_cancel: bool) -> Self {
        if release_seat_on_cancel {
            CancellationPolicy::ReleaseSeat
        } else {
            CancellationPolicy::KeepSeat
        }
    }
}

/// Single-actor booking session over the train and user collections.
///
/// Business failures come back as [`Rejection`]s inside `Ok`; only storage faults are `Err`.
pub struct BookingDesk {
    directory: TrainDirectory,
    ledger: UserLedger,
    hasher: Arc<dyn CredentialHasher>,
    policy: CancellationPolicy,
    session: Option<Session>,
}

impl BookingDesk {
    pub fn new(
        directory: TrainDirectory,
        ledger: UserLedger,
        hasher: Arc<dyn CredentialHasher>,
    ) -> Self {
        Self {
            directory,
            ledger,
            hasher,
            policy: CancellationPolicy::default(),
            session: None,
        }
    }

    /// Loads both collections from their repositories.
    pub async fn open(
        trains: Arc<dyn Repository<Train>>,
        users: Arc<dyn Repository<User>>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> CoreResult<Self> {
        let directory = TrainDirectory::load(trains).await?;
        let ledger = UserLedger::load(users).await?;
        Ok(Self::new(directory, ledger, hasher))
    }

    pub fn with_policy(mut self, policy: CancellationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Registers a new rider and logs them in.
    pub async fn sign_up(&mut self, name: &str, password: &str) -> CoreResult<Outcome<Session>> {
        let (name, password) = (name.trim(), password.trim());
        if name.is_empty() || password.is_empty() {
            return Ok(Err(Rejection::EmptyCredentials));
        }
        if self.ledger.contains_name(name) {
            warn!("Signup rejected, user already exists: {}", name);
            return Ok(Err(Rejection::NameTaken(name.to_string())));
        }

        let digest = self.hasher.hash(password)?;
        let user = User::new(name, password, digest);
        let session = Session::open(&user.user_id, &user.name, &user.hashed_password);
        self.ledger.register(user).await?;

        info!(session = %session.token(), "Signed up user {}", name);
        self.session = Some(session.clone());
        Ok(Ok(session))
    }

    /// Replaces any current session. A failed attempt leaves nobody logged in.
    pub fn log_in(&mut self, name: &str, password: &str) -> Outcome<Session> {
        self.session = None;
        let (name, password) = (name.trim(), password.trim());
        if name.is_empty() || password.is_empty() {
            return Err(Rejection::EmptyCredentials);
        }

        let user = self
            .ledger
            .authenticate(name, password, self.hasher.as_ref())
            .ok_or_else(|| {
                warn!("Login failed for {}", name);
                Rejection::InvalidCredentials
            })?;

        let session = Session::open(&user.user_id, &user.name, &user.hashed_password);
        info!(session = %session.token(), "Login successful for user {}", user.name);
        self.session = Some(session.clone());
        Ok(session)
    }

    pub fn log_out(&mut self) {
        self.session = None;
    }

    /// Trains running from `source` to `destination`. Input is trimmed and lowercased.
    pub fn search_trains(&self, source: &str, destination: &str) -> Vec<&Train> {
        let source = source.trim().to_lowercase();
        let destination = destination.trim().to_lowercase();
        self.directory.search(&source, &destination)
    }

    pub fn seat_map(&self, train_id: &str) -> Option<&SeatGrid> {
        self.directory.get(train_id).map(|train| &train.seats)
    }

    /// Claims `seat` on the train and issues a ticket for the logged-in rider.
    ///
    /// The route is not re-checked here; callers pick `train_id` from a prior search.
    /// Nothing is persisted unless the claim succeeds.
    pub async fn book_seat(
        &mut self,
        train_id: &str,
        seat: SeatPosition,
        journey: Journey,
    ) -> CoreResult<Outcome<Ticket>> {
        let session = match self.active_session() {
            Ok(session) => session,
            Err(rejection) => return Ok(Err(rejection)),
        };
        if journey.date_of_travel.trim().is_empty() {
            return Ok(Err(Rejection::EmptyTravelDate));
        }

        let train = match self.directory.get_mut(train_id) {
            Some(train) => train,
            None => return Ok(Err(Rejection::UnknownTrain(train_id.to_string()))),
        };
        if let Err(e) = train.seats.claim(seat) {
            warn!("Booking on train {} rejected: {}", train_id, e);
            return Ok(Err(Rejection::from(e)));
        }
        let booked_train = train.clone();

        if let Err(e) = self.directory.upsert(booked_train.clone()).await {
            self.undo_claim(train_id, seat);
            return Err(e);
        }

        let ticket = Ticket::issue(session.user_id(), &journey, &booked_train, seat);
        if let Some(user) = self.ledger.get_mut(session.user_id()) {
            user.tickets_booked.push(ticket.clone());
        }
        if let Err(e) = self.ledger.persist().await {
            if let Some(user) = self.ledger.get_mut(session.user_id()) {
                user.tickets_booked.retain(|t| t.ticket_id != ticket.ticket_id);
            }
            self.undo_claim(train_id, seat);
            if let Err(restore) = self.directory.persist().await {
                warn!("Could not restore train {} after failed booking: {}", train_id, restore);
            }
            return Err(e);
        }

        info!(
            "Booked {} on train {} for user {} ({} -> {})",
            seat,
            booked_train.train_no,
            session.name(),
            journey.source,
            journey.destination
        );
        emit(
            "seat_booked",
            &SeatBookedEvent {
                ticket_id: ticket.ticket_id.clone(),
                user_id: ticket.user_id.clone(),
                train_id: booked_train.train_id.clone(),
                row: seat.row,
                col: seat.col,
                source: ticket.source.clone(),
                destination: ticket.destination.clone(),
                timestamp: Utc::now().timestamp(),
            },
        );
        Ok(Ok(ticket))
    }

    /// Removes the ticket with `ticket_id` from the logged-in rider.
    ///
    /// Returns `false` for an empty or unknown id. Under [`CancellationPolicy::KeepSeat`] the
    /// train's seats are not touched.
    pub async fn cancel_booking(&mut self, ticket_id: &str) -> CoreResult<Outcome<bool>> {
        let session = match self.active_session() {
            Ok(session) => session,
            Err(rejection) => return Ok(Err(rejection)),
        };
        let ticket_id = ticket_id.trim();
        if ticket_id.is_empty() {
            warn!("Cancellation rejected: empty ticket id");
            return Ok(Ok(false));
        }

        let user = match self.ledger.get(session.user_id()) {
            Some(user) => user,
            None => return Ok(Err(Rejection::SessionExpired)),
        };
        let index = match user.tickets_booked.iter().position(|t| t.ticket_id == ticket_id) {
            Some(index) => index,
            None => {
                info!("No ticket found with id {}", ticket_id);
                return Ok(Ok(false));
            }
        };
        let ticket = user.tickets_booked[index].clone();

        // The freed seat reaches the train file before the ticket leaves the user file.
        let seat_released = match self.policy {
            CancellationPolicy::KeepSeat => None,
            CancellationPolicy::ReleaseSeat => self.release_seat(&ticket),
        };
        if let Some(seat) = seat_released {
            if let Err(e) = self.directory.persist().await {
                self.reclaim_seat(&ticket.train.train_id, seat);
                return Err(e);
            }
        }

        if let Some(user) = self.ledger.get_mut(session.user_id()) {
            user.tickets_booked.remove(index);
        }
        if let Err(e) = self.ledger.persist().await {
            if let Some(user) = self.ledger.get_mut(session.user_id()) {
                user.tickets_booked.insert(index, ticket.clone());
            }
            if let Some(seat) = seat_released {
                self.reclaim_seat(&ticket.train.train_id, seat);
                if let Err(restore) = self.directory.persist().await {
                    warn!(
                        "Could not restore seat {} on train {} after failed cancellation: {}",
                        seat, ticket.train.train_id, restore
                    );
                }
            }
            return Err(e);
        }

        info!("Ticket {} cancelled", ticket_id);
        emit(
            "ticket_cancelled",
            &TicketCancelledEvent {
                ticket_id: ticket.ticket_id.clone(),
                user_id: ticket.user_id.clone(),
                train_id: ticket.train.train_id.clone(),
                seat_released: seat_released.is_some(),
                timestamp: Utc::now().timestamp(),
            },
        );
        Ok(Ok(true))
    }

    /// Tickets of the logged-in rider, after re-checking the session against the stored
    /// credential.
    pub fn list_bookings(&self) -> Outcome<Vec<Ticket>> {
        let session = self.session.as_ref().ok_or(Rejection::NotLoggedIn)?;
        let user = self
            .ledger
            .get(session.user_id())
            .filter(|user| session.matches(&user.user_id, &user.hashed_password))
            .ok_or_else(|| {
                warn!("Stored credentials no longer match session of {}", session.name());
                Rejection::SessionExpired
            })?;
        Ok(user.tickets_booked.clone())
    }

    fn active_session(&self) -> Outcome<Session> {
        let session = self.session.clone().ok_or(Rejection::NotLoggedIn)?;
        if self.ledger.get(session.user_id()).is_none() {
            return Err(Rejection::SessionExpired);
        }
        Ok(session)
    }

    fn undo_claim(&mut self, train_id: &str, seat: SeatPosition) {
        if let Some(train) = self.directory.get_mut(train_id) {
            if let Err(e) = train.seats.release(seat) {
                warn!("Could not undo claim on train {}: {}", train_id, e);
            }
        }
    }

    /// Frees the ticket's seat in memory. `None` when there is nothing to free.
    fn release_seat(&mut self, ticket: &Ticket) -> Option<SeatPosition> {
        let seat = match ticket.seat {
            Some(seat) => seat,
            None => {
                warn!("Ticket {} has no seat on record, nothing to release", ticket.ticket_id);
                return None;
            }
        };
        let train = self.directory.get_mut(&ticket.train.train_id)?;
        match train.seats.release(seat) {
            Ok(()) => Some(seat),
            Err(e) => {
                warn!("Seat release skipped for ticket {}: {}", ticket.ticket_id, e);
                None
            }
        }
    }

    fn reclaim_seat(&mut self, train_id: &str, seat: SeatPosition) {
        if let Some(train) = self.directory.get_mut(train_id) {
            if let Err(e) = train.seats.claim(seat) {
                warn!("Could not re-claim {} on train {}: {}", seat, train_id, e);
            }
        }
    }
}

fn emit<E: Serialize>(kind: &str, event: &E) {
    match serde_json::to_string(event) {
        Ok(payload) => info!(target: "railbook::events", kind, %payload),
        Err(e) => warn!(target: "railbook::events", "Failed to serialize {} event: {}", kind, e),
    }
}

/// Recoverable business outcomes. The message is what the rider sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("No user logged in.")]
    NotLoggedIn,

    #[error("Session is no longer valid, please log in again.")]
    SessionExpired,

    #[error("Username and password cannot be empty.")]
    EmptyCredentials,

    #[error("User already exists: {0}")]
    NameTaken(String),

    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Date of travel cannot be empty.")]
    EmptyTravelDate,

    #[error("Train not found: {0}")]
    UnknownTrain(String),

    #[error("Invalid seat selection.")]
    InvalidSelection,

    #[error("Seat already booked.")]
    SeatUnavailable,
}

impl From<SeatError> for Rejection {
    fn from(err: SeatError) -> Self {
        match err {
            SeatError::AlreadyBooked(_) => Rejection::SeatUnavailable,
            _ => Rejection::InvalidSelection,
        }
    }
}
