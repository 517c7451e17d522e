//! End-to-end dialogue scenarios against the in-memory stores

use chrono::{NaiveDate, NaiveTime};
use mesa::application::{ConversationEngine, TurnRequest, TurnResponse};
use mesa::domain::conversation::{Capabilities, SessionStore, Step};
use mesa::domain::language::Language;
use mesa::domain::lexicon::Lexicon;
use mesa::domain::shared::FixedClock;
use mesa::infrastructure::persistence::InMemoryReservationStore;
use mesa::infrastructure::session::InMemorySessionStore;
use std::sync::Arc;

const CALLER_ID: &str = "+34600111222";

struct Harness {
    engine: ConversationEngine,
    sessions: Arc<InMemorySessionStore>,
    reservations: Arc<InMemoryReservationStore>,
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
}

fn harness(capabilities: Capabilities) -> Harness {
    let lexicon = Arc::new(Lexicon::embedded().unwrap());
    let sessions = Arc::new(InMemorySessionStore::new());
    let reservations = Arc::new(InMemoryReservationStore::new());
    let engine = ConversationEngine::new(lexicon, sessions.clone(), reservations.clone())
        .with_capabilities(capabilities)
        .with_clock(Arc::new(FixedClock::new(today())));
    Harness {
        engine,
        sessions,
        reservations,
    }
}

async fn say(harness: &Harness, utterance: &str) -> TurnResponse {
    harness
        .engine
        .handle_turn(TurnRequest::new(CALLER_ID, utterance))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_scenario_a_express_booking() {
    let h = harness(Capabilities::express());

    let steps = [
        ("hola", Step::AskPeople),
        ("cuatro", Step::AskDate),
        ("mañana", Step::AskTime),
        ("a las nueve", Step::AskName),
        ("me llamo Marta", Step::AskPhone),
    ];
    for (utterance, expected) in steps {
        let response = say(&h, utterance).await;
        assert_eq!(response.step, expected, "after {:?}", utterance);
        assert!(!response.is_final);
        assert_eq!(response.language, Language::Es);
    }

    let last = say(&h, "sí usa este").await;
    assert_eq!(last.step, Step::Finished);
    assert!(last.is_final);

    let session = h.sessions.get(CALLER_ID).await.unwrap().unwrap();
    let slots = session.slots();
    assert_eq!(slots.party_size, Some(4));
    assert_eq!(slots.date, Some(NaiveDate::from_ymd_opt(2025, 1, 16).unwrap()));
    assert_eq!(slots.time, Some(NaiveTime::from_hms_opt(9, 0, 0).unwrap()));
    assert_eq!(slots.name.as_deref(), Some("Marta"));
    assert_eq!(slots.phone.as_deref(), Some(CALLER_ID));

    let saved = h.reservations.reservations().await;
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].customer_name, "Marta");
    assert_eq!(saved[0].phone, CALLER_ID);
    assert!(saved[0].transcript.contains("me llamo Marta"));
}

async fn reach_ask_date(h: &Harness) {
    say(h, "hola").await;
    let response = say(h, "somos cuatro").await;
    assert_eq!(response.step, Step::AskDate);
}

#[tokio::test]
async fn test_scenario_b_cancel_mid_flow() {
    let h = harness(Capabilities::default());
    reach_ask_date(&h).await;

    let response = say(&h, "mejor cancelar").await;
    assert_eq!(response.step, Step::Cancelling);
    assert!(!response.is_final);

    let response = say(&h, "sí").await;
    assert_eq!(response.step, Step::Cancelled);
    assert!(response.is_final);

    let session = h.sessions.get(CALLER_ID).await.unwrap().unwrap();
    assert!(session.history().iter().all(|turn| !turn.text.is_empty()));
    assert!(h.reservations.reservations().await.is_empty());
}

#[tokio::test]
async fn test_scenario_c_declined_cancellation_resumes() {
    let h = harness(Capabilities::default());
    reach_ask_date(&h).await;

    assert_eq!(say(&h, "mejor cancelar").await.step, Step::Cancelling);

    let response = say(&h, "no, sigamos").await;
    assert_eq!(response.step, Step::AskDate);
    assert!(!response.is_final);

    let session = h.sessions.get(CALLER_ID).await.unwrap().unwrap();
    assert_eq!(session.slots().party_size, Some(4));
}

#[tokio::test]
async fn test_scenario_d_unreadable_date_reprompts() {
    let h = harness(Capabilities::default());
    reach_ask_date(&h).await;
    let previous = h
        .sessions
        .get(CALLER_ID)
        .await
        .unwrap()
        .unwrap()
        .last_prompt()
        .unwrap()
        .to_string();

    let response = say(&h, "pues no estoy seguro").await;
    assert_eq!(response.step, Step::AskDate);
    assert_ne!(response.text, previous);
}

#[tokio::test]
async fn test_repeated_misses_keep_changing_prompt() {
    let h = harness(Capabilities::default());
    reach_ask_date(&h).await;

    let mut previous = say(&h, "ni idea").await.text;
    for _ in 0..5 {
        let response = say(&h, "ni idea").await;
        assert_eq!(response.step, Step::AskDate);
        assert_ne!(response.text, previous);
        previous = response.text;
    }
}

#[tokio::test]
async fn test_language_is_locked_after_first_utterance() {
    let h = harness(Capabilities::default());

    let first = say(&h, "hello, I would like to book a table").await;
    assert_eq!(first.language, Language::En);
    assert_eq!(first.step, Step::AskPeople);

    let second = say(&h, "hola, somos 4 personas").await;
    assert_eq!(second.language, Language::En);
    assert_eq!(second.step, Step::AskDate);

    let session = h.sessions.get(CALLER_ID).await.unwrap().unwrap();
    assert_eq!(session.language(), Some(Language::En));
}

#[tokio::test]
async fn test_never_completes_with_missing_slot() {
    let h = harness(Capabilities::express());
    let utterances = [
        "hola",
        "sí",
        "vale",
        "sí usa este",
        "cuatro",
        "sí",
        "perfecto",
        "el mismo",
        "",
        "claro que sí",
    ];
    for utterance in utterances {
        let response = say(&h, utterance).await;
        assert_ne!(response.step, Step::Finished, "after {:?}", utterance);
        assert_ne!(response.step, Step::Complete);
    }
    assert!(h.reservations.reservations().await.is_empty());
}

#[tokio::test]
async fn test_full_flow_with_confirmation_in_english() {
    let h = harness(Capabilities::default());
    let script = [
        ("hi there", Step::AskPeople),
        ("we are two", Step::AskDate),
        ("2025-02-14", Step::AskTime),
        ("at 8 pm", Step::AskName),
        ("my name is John Smith", Step::AskPhone),
        ("no, use another number", Step::AskPhoneNumber),
        ("612 345 678", Step::Confirm),
    ];
    for (utterance, expected) in script {
        assert_eq!(say(&h, utterance).await.step, expected, "after {:?}", utterance);
    }

    let done = say(&h, "yes, that's right").await;
    assert_eq!(done.step, Step::Finished);
    assert!(done.is_final);

    let saved = h.reservations.reservations().await;
    assert_eq!(saved.len(), 1);
    let record = &saved[0];
    assert_eq!(record.party_size, 2);
    assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 2, 14).unwrap());
    assert_eq!(record.time, NaiveTime::from_hms_opt(20, 0, 0).unwrap());
    assert_eq!(record.customer_name, "John Smith");
    assert_eq!(record.phone, "612345678");
    assert_eq!(record.language, Language::En);
    assert!(h.reservations.customer("612345678").await.is_some());

    let goodbye = say(&h, "thanks").await;
    assert!(goodbye.is_final);
    assert_eq!(goodbye.step, Step::Finished);
    assert_eq!(h.reservations.reservations().await.len(), 1);
}

#[tokio::test]
async fn test_separate_calls_do_not_share_state() {
    let h = harness(Capabilities::express());
    say(&h, "hola").await;
    say(&h, "cuatro").await;

    let other = h
        .engine
        .handle_turn(TurnRequest::new("CA-other", "hello"))
        .await
        .unwrap();
    assert_eq!(other.step, Step::AskPeople);
    assert_eq!(other.language, Language::En);

    let session = h.sessions.get(CALLER_ID).await.unwrap().unwrap();
    assert_eq!(session.step(), Step::AskDate);
    assert_eq!(h.sessions.count().await.unwrap(), 2);
}
