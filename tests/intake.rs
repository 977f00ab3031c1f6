//! End-to-end engine runs over the embedded scripts

use intake_gateway::engine::TurnHandler;
use intake_gateway::{FieldValue, Turn};

mod common;
use common::{embedded_engine, temp_store};

#[test]
fn test_coffee_order_full_pass() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir, "coffee_log.json");
    let mut engine = embedded_engine("coffee", store.clone());

    assert_eq!(engine.opening(), "Welcome to Coffee Haven! What drink would you like?");

    let mut turns = Vec::new();
    for utterance in ["latte", "medium", "oat", "whipped cream", "no", "Sam"] {
        turns.push(engine.apply(utterance).unwrap());
    }

    // intermediate turns are prompts, the last is the completion
    assert!(turns[..5].iter().all(|t| !t.is_completion()));
    let Turn::Completion { record, summary, reply } = turns.pop().unwrap() else {
        panic!("expected completion");
    };

    assert_eq!(record["drinkType"], "latte");
    assert_eq!(record["size"], "medium");
    assert_eq!(record["milk"], "oat");
    assert_eq!(record["extras"], serde_json::json!(["whipped cream"]));
    assert_eq!(record["name"], "Sam");
    assert_eq!(
        summary,
        "Drink: latte, Size: medium, Milk: oat, Extras: whipped cream, Name: Sam"
    );
    assert!(reply.contains("Thanks for visiting Coffee Haven!"));

    // persisted exactly once, and only at completion
    let entries = store.load();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0], record);
    assert!(entries[0]["date"].is_string());

    // engine reset: awaiting the first field with a fully empty record
    assert_eq!(engine.cursor().name, "drinkType");
    assert_eq!(
        engine.record().value("name"),
        Some(&FieldValue::Scalar(None))
    );
}

#[test]
fn test_coffee_no_extras() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir, "coffee_log.json");
    let mut engine = embedded_engine("coffee", store.clone());

    for utterance in ["espresso", "small", "none"] {
        engine.apply(utterance).unwrap();
    }
    // "none" at the extras turn closes the list without blocking progress
    let turn = engine.apply("none").unwrap();
    assert!(matches!(turn, Turn::Prompt { ref field, .. } if field == "name"));

    let turn = engine.apply("Riley").unwrap();
    let Turn::Completion { record, summary, .. } = turn else {
        panic!("expected completion");
    };
    assert_eq!(record["extras"], serde_json::json!([]));
    assert!(summary.contains("Extras: None"));
    assert_eq!(store.load().len(), 1);
}

#[test]
fn test_wellness_step_durability_and_recall() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir, "wellness_log.json");

    let mut engine = embedded_engine("wellness", store.clone());
    // no prior history: plain greeting
    assert!(!engine.opening().contains("Last time"));

    engine.apply("calm").unwrap();
    engine.apply("high").unwrap();
    engine.apply("deadlines").unwrap();
    engine.apply("ship the release").unwrap();
    // partial snapshots were written after each accepted answer
    assert_eq!(store.load().len(), 4);

    let turn = engine.apply("done").unwrap();
    let Turn::Completion { summary, .. } = turn else {
        panic!("expected completion");
    };
    assert_eq!(
        summary,
        "Mood: calm, Energy: high, Stress: deadlines, Objectives: ship the release"
    );

    // closing the list wrote nothing; completion appended once
    let entries = store.load();
    assert_eq!(entries.len(), 5);
    assert_eq!(entries[4]["objectives"], serde_json::json!(["ship the release"]));
    assert_eq!(entries[4]["summary"], summary);

    // a later session greets with the previous summary
    let engine = embedded_engine("wellness", store);
    let opening = engine.opening();
    assert!(opening.starts_with("Let's start your daily wellness check-in!"));
    assert!(opening.contains(&format!("Last time you mentioned: {summary}")));
}

#[test]
fn test_wellness_multiple_objectives() {
    let dir = tempfile::tempdir().unwrap();
    let store = temp_store(&dir, "wellness_log.json");
    let mut engine = embedded_engine("wellness", store.clone());

    for utterance in ["okay", "medium", "nothing", "run", "read", "cook", "done"] {
        engine.apply(utterance).unwrap();
    }

    let entries = store.load();
    let last = entries.last().unwrap();
    assert_eq!(last["objectives"], serde_json::json!(["run", "read", "cook"]));
    assert_eq!(
        last["summary"],
        "Mood: okay, Energy: medium, Stress: nothing, Objectives: run, read, cook"
    );
}
