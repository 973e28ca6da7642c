use super::*;

use crate::{event_channel, test_support::FakeApi};

fn login_flow(api: &Arc<FakeApi>, events: broadcast::Sender<ClientEvent>) -> LoginFlow {
    let api: Arc<dyn MessagingApi> = Arc::clone(api) as Arc<dyn MessagingApi>;
    LoginFlow::new(api, Scheduler::current(), events)
}

fn registration_flow(api: &Arc<FakeApi>) -> RegistrationFlow {
    let api: Arc<dyn MessagingApi> = Arc::clone(api) as Arc<dyn MessagingApi>;
    RegistrationFlow::new(api, Scheduler::current(), event_channel())
}

async fn fill(form: &LiveForm, values: &[(&str, &str)]) {
    for (id, value) in values {
        form.input(id, *value).await;
    }
    tokio::time::sleep(Duration::from_millis(350)).await;
}

#[test]
fn flash_messages_are_recognised_exactly() {
    assert_eq!(
        Flash::from_message("  Registration successful! "),
        Some(Flash::RegistrationSucceeded)
    );
    assert_eq!(
        Flash::from_message("Your session has expired. Please log in again."),
        Some(Flash::SessionExpired)
    );
    assert_eq!(Flash::from_message("Welcome"), None);
}

#[tokio::test(start_paused = true)]
async fn banner_hides_after_three_seconds() {
    let events = event_channel();
    let mut rx = events.subscribe();
    let slot = BannerSlot::new(Scheduler::current(), events);

    slot.show(Banner::warning("nope"), BANNER_DURATION);
    assert_eq!(slot.current(), Some(Banner::warning("nope")));

    tokio::time::sleep(Duration::from_millis(2990)).await;
    assert!(slot.current().is_some());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(slot.current(), None);

    assert!(matches!(rx.recv().await, Ok(ClientEvent::Banner(Some(_)))));
    assert!(matches!(rx.recv().await, Ok(ClientEvent::Banner(None))));
}

#[tokio::test(start_paused = true)]
async fn newer_banner_restarts_the_hide_timer() {
    let slot = BannerSlot::new(Scheduler::current(), event_channel());

    slot.show(Banner::warning("first"), BANNER_DURATION);
    tokio::time::sleep(Duration::from_secs(2)).await;
    slot.show(Banner::warning("second"), BANNER_DURATION);
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(slot.current(), Some(Banner::warning("second")));
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(slot.current(), None);
}

#[tokio::test(start_paused = true)]
async fn login_posts_trimmed_credentials_and_follows_redirect() {
    let api = Arc::new(FakeApi::default());
    let events = event_channel();
    let mut rx = events.subscribe();
    let flow = login_flow(&api, events);

    // Leading space fails validation, so submit is refused outright.
    fill(flow.form(), &[(fields::USERNAME, "jane"), (fields::PASSWORD, " secret")]).await;
    assert_eq!(flow.submit().await, None);
    assert!(api.logins.lock().expect("logins").is_empty());

    fill(flow.form(), &[(fields::PASSWORD, "secret")]).await;
    assert_eq!(flow.submit().await, Some(Navigation::Inbox));

    let logins = api.logins.lock().expect("logins").clone();
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].username, "jane");
    assert_eq!(logins[0].password, "secret");

    let mut navigated = None;
    while let Ok(event) = rx.try_recv() {
        if let ClientEvent::Navigate(target) = event {
            navigated = Some(target);
        }
    }
    assert_eq!(navigated, Some(Navigation::Inbox));
}

#[tokio::test(start_paused = true)]
async fn rejected_login_shows_server_message_in_banner() {
    let api = Arc::new(FakeApi::default());
    let flow = login_flow(&api, event_channel());

    fill(flow.form(), &[(fields::USERNAME, "jane"), (fields::PASSWORD, "wrong")]).await;
    assert_eq!(flow.submit().await, None);
    assert_eq!(
        flow.banner(),
        Some(Banner::warning("Invalid username or password"))
    );

    tokio::time::sleep(BANNER_DURATION + Duration::from_millis(10)).await;
    assert_eq!(flow.banner(), None);
}

#[tokio::test(start_paused = true)]
async fn flash_after_registration_stays_five_seconds() {
    let api = Arc::new(FakeApi::default());
    let flow = login_flow(&api, event_channel());

    flow.load(Some("Registration successful!"))
        .await
        .expect("load");
    assert_eq!(
        flow.banner(),
        Some(Banner::success("Registration successful!"))
    );

    tokio::time::sleep(Duration::from_millis(4000)).await;
    assert!(flow.banner().is_some());
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert_eq!(flow.banner(), None);

    assert!(!flow.show_flash("something else"));
    assert_eq!(flow.banner(), None);
}

#[tokio::test(start_paused = true)]
async fn registration_success_returns_to_login() {
    let api = Arc::new(FakeApi::default());
    let flow = registration_flow(&api);

    fill(
        flow.form(),
        &[
            (fields::USERNAME, "zoe"),
            (fields::FIRST_NAME, "Zoë"),
            (fields::LAST_NAME, "Müller"),
            (fields::PASSWORD, "hunter2"),
        ],
    )
    .await;
    assert_eq!(flow.submit().await, Some(Navigation::Login));
    assert_eq!(
        flow.banner(),
        Some(Banner::success("Registration successful!"))
    );

    let registrations = api.registrations.lock().expect("registrations").clone();
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].first_name, "Zoë");
    assert_eq!(registrations[0].last_name, "Müller");
}

#[tokio::test(start_paused = true)]
async fn taken_username_keeps_registration_open() {
    let api = Arc::new(FakeApi::default());
    let flow = registration_flow(&api);

    fill(
        flow.form(),
        &[
            (fields::USERNAME, "taken"),
            (fields::FIRST_NAME, "Ann"),
            (fields::LAST_NAME, "Other"),
            (fields::PASSWORD, "pw"),
        ],
    )
    .await;
    assert_eq!(flow.submit().await, None);
    assert_eq!(flow.banner(), Some(Banner::warning(REGISTRATION_FAILED)));
}

#[tokio::test]
async fn registration_refuses_incomplete_form() {
    let api = Arc::new(FakeApi::default());
    let flow = registration_flow(&api);

    flow.form().input(fields::USERNAME, "zoe").await;
    assert_eq!(flow.submit().await, None);
    assert!(api.registrations.lock().expect("registrations").is_empty());
    assert_eq!(flow.go_to_login(), Navigation::Login);
}
