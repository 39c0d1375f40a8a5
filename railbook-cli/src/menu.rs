use std::fmt::Display;

use railbook_catalog::{SeatPosition, Train};
use railbook_order::Journey;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};
use tracing::{error, info};

use crate::error::AppError;
use crate::state::{AppState, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    SignUp,
    Login,
    FetchBookings,
    SearchTrains,
    BookSeat,
    CancelBooking,
    Exit,
}

impl MenuChoice {
    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            1 => Some(MenuChoice::SignUp),
            2 => Some(MenuChoice::Login),
            3 => Some(MenuChoice::FetchBookings),
            4 => Some(MenuChoice::SearchTrains),
            5 => Some(MenuChoice::BookSeat),
            6 => Some(MenuChoice::CancelBooking),
            7 => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

const MENU: &str = "Choose option:
1. Sign up
2. Login
3. Fetch Bookings
4. Search Trains
5. Book a Seat
6. Cancel my Booking
7. Exit the App";

/// Line-oriented prompt over any async reader/writer pair.
struct Console<R, W> {
    lines: Lines<R>,
    out: W,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    async fn say(&mut self, text: impl Display) -> std::io::Result<()> {
        self.out.write_all(format!("{}\n", text).as_bytes()).await?;
        self.out.flush().await
    }

    /// `None` once input is exhausted.
    async fn ask(&mut self, question: impl Display) -> std::io::Result<Option<String>> {
        self.say(question).await?;
        Ok(self.lines.next_line().await?.map(|line| line.trim().to_string()))
    }
}

/// 1-based menu input to a zero-based index.
pub fn parse_position(input: &str) -> Option<usize> {
    input.trim().parse::<usize>().ok()?.checked_sub(1)
}

/// Runs the numbered menu until the rider exits or input ends.
///
/// Storage faults abort the current option only; terminal faults end the session.
pub async fn run<R, W>(state: &mut AppState, input: R, output: W) -> Result<(), AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut console = Console {
        lines: input.lines(),
        out: output,
    };
    console.say("Running Train Booking System").await?;

    loop {
        let line = match console.ask(format!("{}\nEnter your choice:", MENU)).await? {
            Some(line) => line,
            None => break,
        };
        let choice = match line.parse::<u32>() {
            Ok(number) => MenuChoice::from_number(number),
            Err(_) => {
                console
                    .say("Invalid input. Please enter a number between 1 and 7.")
                    .await?;
                continue;
            }
        };
        let choice = match choice {
            Some(choice) => choice,
            None => {
                console.say("Invalid option. Please choose between 1 and 7.").await?;
                continue;
            }
        };
        if choice == MenuChoice::Exit {
            console.say("Exiting the application.").await?;
            break;
        }

        match handle(choice, state, &mut console).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::InputClosed) => break,
            Err(e) if e.is_recoverable() => {
                error!("Operation {:?} failed: {}", choice, e);
                console.say(format!("Error: {}", e)).await?;
            }
            Err(e) => return Err(e),
        }
    }

    info!("Session ended");
    Ok(())
}

enum Flow {
    Continue,
    InputClosed,
}

/// Unwraps a prompt answer or stops the option when input has ended.
macro_rules! answer {
    ($console:expr, $question:expr) => {
        match $console.ask($question).await? {
            Some(answer) => answer,
            None => return Ok(Flow::InputClosed),
        }
    };
}

async fn handle<R, W>(
    choice: MenuChoice,
    state: &mut AppState,
    console: &mut Console<R, W>,
) -> Result<Flow, AppError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match choice {
        MenuChoice::SignUp => {
            let name = answer!(console, "Enter the username to signup");
            let password = answer!(console, "Enter the password to signup");
            match state.desk.sign_up(&name, &password).await? {
                Ok(session) => {
                    console
                        .say(format!("Sign up successful! Logged in as {}.", session.name()))
                        .await?
                }
                Err(rejection) => console.say(format!("Sign up failed! {}", rejection)).await?,
            }
        }
        MenuChoice::Login => {
            let name = answer!(console, "Enter the username to Login");
            let password = answer!(console, "Enter the password to Login");
            match state.desk.log_in(&name, &password) {
                Ok(_) => console.say("Login successful!").await?,
                Err(rejection) => console.say(format!("Login failed: {}", rejection)).await?,
            }
        }
        MenuChoice::FetchBookings => {
            console.say("Fetching your bookings").await?;
            match state.desk.list_bookings() {
                Ok(tickets) if tickets.is_empty() => console.say("No bookings found.").await?,
                Ok(tickets) => {
                    for ticket in tickets {
                        console.say(ticket).await?;
                    }
                }
                Err(rejection) => console.say(rejection).await?,
            }
        }
        MenuChoice::SearchTrains => {
            state.selection = None;
            let source = answer!(console, "Type your source station").to_lowercase();
            let destination = answer!(console, "Type your destination station").to_lowercase();
            if source.is_empty() || destination.is_empty() {
                console.say("Source and destination cannot be empty.").await?;
                return Ok(Flow::Continue);
            }

            let trains: Vec<Train> = state
                .desk
                .search_trains(&source, &destination)
                .into_iter()
                .cloned()
                .collect();
            if trains.is_empty() {
                console.say("No trains found for the given route.").await?;
                return Ok(Flow::Continue);
            }
            for (index, train) in trains.iter().enumerate() {
                console
                    .say(format!(
                        "Train {}: ID {}, No: {}",
                        index + 1,
                        train.train_id,
                        train.train_no
                    ))
                    .await?;
                for station in &train.stations {
                    let time = train
                        .station_times
                        .get(station)
                        .map(String::as_str)
                        .unwrap_or("-");
                    console.say(format!("  Station: {}, Time: {}", station, time)).await?;
                }
            }

            let pick = answer!(console, "Select a train by number (1, 2, 3...):");
            match parse_position(&pick).and_then(|index| trains.get(index)) {
                Some(train) => {
                    console.say(format!("Selected train {}", train.train_no)).await?;
                    state.selection = Some(Selection {
                        train_id: train.train_id.clone(),
                        source,
                        destination,
                    });
                }
                None => console.say("Invalid train selection.").await?,
            }
        }
        MenuChoice::BookSeat => {
            let selection = match state.selection.clone() {
                Some(selection) => selection,
                None => {
                    console
                        .say(
                            "No train selected or source/destination not set. \
                             Please search for a train first.",
                        )
                        .await?;
                    return Ok(Flow::Continue);
                }
            };
            if state.desk.session().is_none() {
                console.say("Please log in first.").await?;
                return Ok(Flow::Continue);
            }

            let rows: Vec<String> = match state.desk.seat_map(&selection.train_id) {
                Some(grid) => grid
                    .rows()
                    .iter()
                    .enumerate()
                    .map(|(index, row)| {
                        let flags: Vec<String> = row.iter().map(|seat| seat.to_string()).collect();
                        format!("Row {}: [{}]", index + 1, flags.join(", "))
                    })
                    .collect(),
                None => {
                    console.say("Selected train is no longer available.").await?;
                    state.selection = None;
                    return Ok(Flow::Continue);
                }
            };
            console
                .say("Select a seat out of these seats (0 = available, 1 = booked)")
                .await?;
            for row in rows {
                console.say(row).await?;
            }

            let row = answer!(console, "Enter the row number");
            let Some(row) = parse_position(&row) else {
                console.say("Invalid row input.").await?;
                return Ok(Flow::Continue);
            };
            let col = answer!(console, "Enter the column number");
            let Some(col) = parse_position(&col) else {
                console.say("Invalid column input.").await?;
                return Ok(Flow::Continue);
            };
            let date = answer!(console, "Enter the date of travel (e.g., 2023-12-08T18:30:00Z)");
            if date.is_empty() {
                console.say("Date of travel cannot be empty.").await?;
                return Ok(Flow::Continue);
            }

            console.say("Booking your seat...").await?;
            let journey = Journey::new(selection.source, selection.destination, date);
            match state
                .desk
                .book_seat(&selection.train_id, SeatPosition::new(row, col), journey)
                .await?
            {
                Ok(ticket) => {
                    console
                        .say(format!("Booked! Enjoy your journey. Ticket ID: {}", ticket.ticket_id))
                        .await?
                }
                Err(rejection) => {
                    console
                        .say(format!("Cannot book this seat. {}", rejection))
                        .await?
                }
            }
        }
        MenuChoice::CancelBooking => {
            if state.desk.session().is_none() {
                console.say("Please log in first.").await?;
                return Ok(Flow::Continue);
            }
            let ticket_id = answer!(console, "Enter the ticket ID to cancel");
            if ticket_id.is_empty() {
                console.say("Ticket ID cannot be empty.").await?;
                return Ok(Flow::Continue);
            }
            match state.desk.cancel_booking(&ticket_id).await? {
                Ok(true) => console.say(format!("Ticket with ID {} canceled.", ticket_id)).await?,
                Ok(false) => console.say(format!("No ticket found with ID {}", ticket_id)).await?,
                Err(rejection) => console.say(rejection).await?,
            }
        }
        MenuChoice::Exit => {}
    }
    Ok(Flow::Continue)
}
