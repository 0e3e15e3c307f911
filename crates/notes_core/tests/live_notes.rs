use notes_core::{DatabaseConfig, Note, NoteDatabase, NoteRepository};
use std::time::Duration;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn unseeded_database() -> NoteDatabase {
    let config = DatabaseConfig {
        seed_on_create: false,
        ..DatabaseConfig::default()
    };
    NoteDatabase::open_in_memory(&config).unwrap()
}

fn titles(notes: &[Note]) -> Vec<&str> {
    notes.iter().map(|note| note.title.as_str()).collect()
}

#[tokio::test]
async fn subscriber_gets_current_snapshot_then_updates() {
    let database = unseeded_database();
    let repo = NoteRepository::new(&database).unwrap();
    let mut notes = repo.get_all_notes();

    let initial = timeout(WAIT, notes.next()).await.unwrap().unwrap();
    assert!(initial.is_empty());

    repo.insert(Note::new("buy milk", "2 liters", 3));
    let updated = timeout(WAIT, notes.next()).await.unwrap().unwrap();
    assert_eq!(titles(&updated), vec!["buy milk"]);
}

#[tokio::test]
async fn stream_stays_sorted_by_priority() {
    let database = unseeded_database();
    let repo = NoteRepository::new(&database).unwrap();
    let mut notes = repo.get_all_notes();

    for priority in [4, 1, 3, 2] {
        repo.insert(Note::new(format!("p{priority}"), "", priority));
    }

    let full = timeout(WAIT, notes.wait_for(|snapshot| snapshot.len() == 4))
        .await
        .unwrap()
        .unwrap();
    let priorities: Vec<_> = full.iter().map(|note| note.priority).collect();
    assert_eq!(priorities, vec![4, 3, 2, 1]);
}

#[tokio::test]
async fn delete_all_emits_empty_snapshot() {
    let database = NoteDatabase::open_in_memory(&DatabaseConfig::default()).unwrap();
    database.wait_for_seed();
    let repo = NoteRepository::new(&database).unwrap();
    let mut notes = repo.get_all_notes();

    let seeded = timeout(WAIT, notes.next()).await.unwrap().unwrap();
    assert_eq!(titles(&seeded), vec!["title4", "title3", "title2", "title1"]);

    repo.delete_all();
    let cleared = timeout(WAIT, notes.next()).await.unwrap().unwrap();
    assert!(cleared.is_empty());
}

#[tokio::test]
async fn every_subscriber_sees_the_final_state() {
    let database = unseeded_database();
    let repo = NoteRepository::new(&database).unwrap();
    let mut first = repo.get_all_notes();
    let mut second = repo.get_all_notes();

    repo.insert(Note::new("a", "", 1));
    repo.insert(Note::new("b", "", 2));
    repo.delete_all();
    repo.insert(Note::new("c", "", 3));

    for live in [&mut first, &mut second] {
        let last = timeout(WAIT, live.wait_for(|snapshot| titles(snapshot) == ["c"]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(last.len(), 1);
    }
}
