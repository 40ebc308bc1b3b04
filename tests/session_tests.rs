//! Session service behaviour seen through the public API.

use pretty_assertions::assert_eq;
use serde_json::json;

use weather_agent::events::{Event, USER_AUTHOR};
use weather_agent::session::{InMemorySessionService, SessionService, State};
use weather_agent::types::ModelMessage;

#[tokio::test]
async fn initial_state_and_events_survive_reload() {
    let service = InMemorySessionService::new();
    let mut initial = State::new();
    initial.set("user_preference_temperature_unit", "Fahrenheit");

    let mut session = service
        .create_session("weather_tutorial_app", "user_state_demo", Some(initial), Some("s1"))
        .await
        .unwrap();
    assert_eq!(
        session.state.get_str("user_preference_temperature_unit"),
        Some("Fahrenheit")
    );

    let event = Event::new("inv-1", USER_AUTHOR).with_content(ModelMessage::user("Hi"));
    service.append_event(&mut session, event.clone()).await.unwrap();

    let reloaded = service
        .get_session("weather_tutorial_app", "user_state_demo", "s1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.events, vec![event]);
    assert_eq!(reloaded.state, session.state);
}

#[tokio::test]
async fn sessions_are_isolated_per_user() {
    let service = InMemorySessionService::new();
    service.create_session("app", "alice", None, Some("s1")).await.unwrap();
    service.create_session("app", "bob", None, Some("s1")).await.unwrap();

    assert_eq!(service.list_sessions("app", "alice").await.unwrap().len(), 1);
    assert!(service.get_session("app", "carol", "s1").await.unwrap().is_none());
}

#[tokio::test]
async fn listed_sessions_omit_events() {
    let service = InMemorySessionService::new();
    let mut session = service.create_session("app", "u", None, Some("s1")).await.unwrap();
    let mut event = Event::new("inv", "weather_agent");
    event.actions.state_delta.insert("last_city_checked".into(), json!("Rome"));
    service.append_event(&mut session, event).await.unwrap();

    let listed = service.list_sessions("app", "u").await.unwrap();
    assert!(listed[0].events.is_empty());
    assert_eq!(listed[0].state.get_str("last_city_checked"), Some("Rome"));
}

#[tokio::test]
async fn initial_scoped_keys_are_routed() {
    let service = InMemorySessionService::new();
    let mut initial = State::new();
    initial.set("app:motd", "hi");
    initial.set("temp:scratch", 1);
    service
        .create_session("app", "u1", Some(initial), Some("s1"))
        .await
        .unwrap();

    let other = service.create_session("app", "u2", None, Some("s2")).await.unwrap();
    assert_eq!(other.state.get_str("app:motd"), Some("hi"));
    let first = service.get_session("app", "u1", "s1").await.unwrap().unwrap();
    assert!(!first.state.contains("temp:scratch"));
}
