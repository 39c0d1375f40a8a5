use std::sync::Arc;

use railbook_catalog::{SeatGrid, Train};
use railbook_cli::{menu, AppState};
use railbook_core::{Argon2Hasher, InMemoryRepository, Repository};
use railbook_order::{BookingDesk, CancellationPolicy, User};
use railbook_store::JsonFileRepository;

fn t1() -> Train {
    Train::new("T1", "12345")
        .with_station("a", "08:00")
        .with_station("b", "10:00")
        .with_station("c", "12:00")
        .with_seats(SeatGrid::from_flags(vec![vec![0, 0], vec![0, 1]]).unwrap())
}

async fn desk(trains: Arc<dyn Repository<Train>>, users: Arc<dyn Repository<User>>) -> BookingDesk {
    BookingDesk::open(trains, users, Arc::new(Argon2Hasher::with_cost(8, 1).unwrap()))
        .await
        .unwrap()
}

async fn drive(state: &mut AppState, script: &str) -> String {
    let mut out = Vec::new();
    menu::run(state, script.as_bytes(), &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_book_then_rebook_taken_seat() {
    let trains = Arc::new(InMemoryRepository::with_records(vec![t1()]));
    let users = Arc::new(InMemoryRepository::<User>::new());
    let mut state = AppState::new(desk(trains.clone(), users.clone()).await);

    let script = "1\nalice\npw\n\
                  4\nA\nc\n1\n\
                  5\n1\n1\n2023-12-08T18:30:00Z\n\
                  5\n2\n2\n2023-12-08T18:30:00Z\n\
                  3\n\
                  7\n";
    let output = drive(&mut state, script).await;

    assert!(output.contains("Sign up successful! Logged in as alice."));
    assert!(output.contains("Train 1: ID T1, No: 12345"));
    assert!(output.contains("  Station: b, Time: 10:00"));
    assert!(output.contains("Row 2: [0, 1]"));
    assert!(output.contains("Booked! Enjoy your journey."));
    assert!(output.contains("Cannot book this seat. Seat already booked."));
    assert!(output.contains("from a to c on 2023-12-08T18:30:00Z"));
    assert!(output.trim_end().ends_with("Exiting the application."));

    assert_eq!(trains.snapshot()[0].seats.to_flags(), vec![vec![1, 0], vec![0, 1]]);
    let stored = users.snapshot();
    assert_eq!(stored[0].tickets_booked.len(), 1);
    assert_eq!(stored[0].tickets_booked[0].source, "a");
}

#[tokio::test]
async fn test_cancel_leaves_seat_booked() {
    let trains = Arc::new(InMemoryRepository::with_records(vec![t1()]));
    let users = Arc::new(InMemoryRepository::<User>::new());
    let mut state = AppState::new(desk(trains.clone(), users.clone()).await);

    drive(&mut state, "1\nbob\npw\n4\na\nb\n1\n5\n1\n2\n2024-01-01\n7\n").await;
    let ticket_id = state.desk.list_bookings().unwrap()[0].ticket_id.clone();

    let output = drive(&mut state, &format!("6\nnope\n6\n{}\n3\n7\n", ticket_id)).await;
    assert!(output.contains("No ticket found with ID nope"));
    assert!(output.contains(&format!("Ticket with ID {} canceled.", ticket_id)));
    assert!(output.contains("No bookings found."));

    assert_eq!(trains.snapshot()[0].seats.to_flags(), vec![vec![0, 1], vec![0, 1]]);
}

#[tokio::test]
async fn test_guards_and_bad_input_keep_session_alive() {
    let trains = Arc::new(InMemoryRepository::with_records(vec![t1()]));
    let users = Arc::new(InMemoryRepository::<User>::new());
    let mut state = AppState::new(desk(trains.clone(), users).await);

    let script = "x\n9\n5\n3\n6\n4\nc\na\n4\na\nc\n1\n5\n2\nalice\npw\n1\nalice\npw\n5\n0\n5\n1\n3\n2024-01-01\n";
    let output = drive(&mut state, script).await;

    assert!(output.contains("Invalid input. Please enter a number between 1 and 7."));
    assert!(output.contains("Invalid option. Please choose between 1 and 7."));
    assert!(output.contains("Please search for a train first."));
    assert!(output.contains("No user logged in."));
    assert!(output.contains("Please log in first."));
    assert!(output.contains("No trains found for the given route."));
    assert!(output.contains("Login failed: Invalid username or password."));
    assert!(output.contains("Invalid row input."));
    assert!(output.contains("Cannot book this seat. Invalid seat selection."));

    // Input ran out without choosing 7; nothing was booked
    assert_eq!(trains.snapshot(), vec![t1()]);
    assert_eq!(trains.save_count(), 0);
}

#[tokio::test]
async fn test_storage_fault_is_reported_and_menu_continues() {
    let trains = Arc::new(InMemoryRepository::with_records(vec![t1()]));
    let users = Arc::new(InMemoryRepository::<User>::new());
    let mut state = AppState::new(desk(trains.clone(), users.clone()).await);
    users.fail_saves(true);

    let output = drive(&mut state, "1\ncarol\npw\n3\n7\n").await;
    assert!(output.contains("Error: Storage failure"));
    assert!(output.contains("No user logged in."));
    assert!(output.contains("Exiting the application."));
}

#[tokio::test]
async fn test_json_files_survive_restart() {
    let dir = std::env::temp_dir().join(format!("railbook-session-{}", uuid::Uuid::new_v4()));
    let train_repo = Arc::new(JsonFileRepository::<Train>::new(dir.join("trains.json")));
    let user_repo = Arc::new(JsonFileRepository::<User>::new(dir.join("users.json")));
    train_repo.save_all(&[t1()]).await.unwrap();

    let mut state = AppState::new(desk(train_repo.clone(), user_repo.clone()).await);
    drive(&mut state, "1\ndana\npw\n4\nb\nc\n1\n5\n2\n1\n2024-02-02\n7\n").await;

    let mut reopened = desk(train_repo, user_repo)
        .await
        .with_policy(CancellationPolicy::KeepSeat);
    assert_eq!(
        reopened.seat_map("T1").unwrap().to_flags(),
        vec![vec![0, 0], vec![1, 1]]
    );
    reopened.log_in("DANA", "pw").unwrap();
    let tickets = reopened.list_bookings().unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0].destination, "c");
}
