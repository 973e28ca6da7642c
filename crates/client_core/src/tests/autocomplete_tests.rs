use super::*;

use crate::{
    event_channel,
    test_support::{user, FakeApi},
};

fn fake_directory() -> Arc<FakeApi> {
    let api = FakeApi::default();
    *api.users.lock().expect("users") = vec![
        user("bobby", "Bob", "Builder"),
        user("bobcat", "Robert", "Catt"),
        user("alice", "Alice", "Liddell"),
    ];
    Arc::new(api)
}

fn assistant(api: &Arc<FakeApi>) -> Arc<Autocomplete> {
    let api: Arc<dyn MessagingApi> = Arc::clone(api) as Arc<dyn MessagingApi>;
    Autocomplete::new(api, Scheduler::current(), event_channel())
}

#[tokio::test(start_paused = true)]
async fn searches_after_half_second_of_idle_input() {
    let api = fake_directory();
    let assistant = assistant(&api);

    assistant.on_input("bob").await;
    tokio::time::sleep(Duration::from_millis(499)).await;
    assert!(api.searches().is_empty());

    tokio::time::sleep(Duration::from_millis(5)).await;
    assert_eq!(api.searches(), vec!["bob".to_string()]);

    let view = assistant.snapshot().await;
    assert!(view.open);
    assert_eq!(
        view.suggestions
            .iter()
            .map(|s| s.label.as_str())
            .collect::<Vec<_>>(),
        vec!["Builder, Bob (bobby)", "Catt, Robert (bobcat)"]
    );
}

#[tokio::test(start_paused = true)]
async fn single_character_never_searches() {
    let api = fake_directory();
    let assistant = assistant(&api);

    assistant.on_input("b").await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(api.searches().is_empty());
    assert!(!assistant.snapshot().await.open);
}

#[tokio::test(start_paused = true)]
async fn typing_burst_sends_one_search_for_final_value() {
    let api = fake_directory();
    let assistant = assistant(&api);

    for value in ["b", "bo", "bob", "bobc"] {
        assistant.on_input(value).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(api.searches(), vec!["bobc".to_string()]);
    let view = assistant.snapshot().await;
    assert_eq!(view.suggestions.len(), 1);
    assert_eq!(view.suggestions[0].username, "bobcat");
}

#[tokio::test(start_paused = true)]
async fn clearing_the_field_closes_dropdown_and_cancels_search() {
    let api = fake_directory();
    let assistant = assistant(&api);

    assistant.on_input("al").await;
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(assistant.snapshot().await.open);

    assistant.on_input("ali").await;
    assistant.on_input("").await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    let view = assistant.snapshot().await;
    assert!(!view.open);
    assert!(view.suggestions.is_empty());
    assert_eq!(api.searches(), vec!["al".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn no_matches_closes_dropdown() {
    let api = fake_directory();
    let assistant = assistant(&api);

    assistant.on_input("zz").await;
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(!assistant.snapshot().await.open);
}

#[tokio::test]
async fn selecting_fills_value_and_closes() {
    let api = fake_directory();
    let assistant = assistant(&api);
    assistant
        .apply_results(&[user("bobby", "Bob", "Builder")])
        .await;
    assert!(assistant.snapshot().await.open);

    assistant.select("bobby").await;
    let view = assistant.snapshot().await;
    assert_eq!(view.value, "bobby");
    assert!(!view.open);
}

#[tokio::test]
async fn clicking_outside_closes_without_selecting() {
    let api = fake_directory();
    let assistant = assistant(&api);
    assistant.on_input("bo").await;
    assistant
        .apply_results(&[user("bobby", "Bob", "Builder")])
        .await;

    assistant.click_outside().await;
    let view = assistant.snapshot().await;
    assert_eq!(view.value, "bo");
    assert!(!view.open);
}

#[tokio::test(start_paused = true)]
async fn slow_earlier_search_overwrites_faster_later_one() {
    let api = fake_directory();
    api.search_delays
        .lock()
        .expect("delays")
        .insert("bo".to_string(), Duration::from_secs(3));
    let assistant = assistant(&api);

    assistant.on_input("bo").await;
    tokio::time::sleep(Duration::from_millis(600)).await;
    assistant.on_input("ali").await;
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(assistant.snapshot().await.suggestions[0].username, "alice");

    tokio::time::sleep(Duration::from_secs(3)).await;
    let view = assistant.snapshot().await;
    assert_eq!(api.searches(), vec!["bo".to_string(), "ali".to_string()]);
    assert_eq!(view.value, "ali");
    assert_eq!(view.suggestions[0].username, "bobby");
}
