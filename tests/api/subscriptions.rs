use chrono::{Duration, Utc};
use uuid::Uuid;
use wiremock::matchers::{any, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::TestApp;
use farm_association_site::{
    domain::subscriber::Subscriber, domain::subscriber_email::SubscriberEmail,
    domain::subscriber_status::SubscriberStatus,
    services::subscription_manager::ActionResult,
    store::in_memory::InMemorySubscriberStore,
};

async fn mount_email_provider(test_app: &TestApp, status: u16) {
    Mock::given(path("/mail/send"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&test_app.email_server)
        .await;
}

#[tokio::test]
async fn subscribe_returns_200_when_body_is_valid() {
    let test_app = TestApp::spawn_app().await;
    mount_email_provider(&test_app, 200).await;

    let response = test_app
        .post_subscription(serde_json::json!({ "name": "Frank", "email": "frank@test.com" }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let result: ActionResult = response.json().await.unwrap();
    assert!(result.success);
}

#[tokio::test]
async fn subscribe_persists_the_new_subscriber() {
    let test_app = TestApp::spawn_app().await;
    mount_email_provider(&test_app, 200).await;

    test_app
        .post_subscription(serde_json::json!({ "name": "Test", "email": "Test@Test.com" }))
        .await;

    let subscribers = test_app.subscribers.subscribers().await;
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0].email.as_ref(), "test@test.com");
    assert_eq!(subscribers[0].name.as_ref().unwrap().as_ref(), "Test");
    assert_eq!(subscribers[0].status.as_ref(), "active");
    assert_eq!(subscribers[0].source, "website");
    assert!(subscribers[0].welcome_email_sent);
}

#[tokio::test]
async fn subscribe_sends_a_welcome_email() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(path("/mail/send"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&test_app.email_server)
        .await;

    test_app
        .post_subscription(serde_json::json!({ "email": "test@test.com" }))
        .await;

    let received_requests = &test_app.email_server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&received_requests[0].body).unwrap();

    assert_eq!(body["personalizations"][0]["to"][0]["email"], "test@test.com");
}

#[tokio::test]
async fn subscribing_twice_does_not_create_a_second_record() {
    let test_app = TestApp::spawn_app().await;

    Mock::given(path("/mail/send"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&test_app.email_server)
        .await;

    let body = serde_json::json!({ "email": "twice@test.com" });
    let first: ActionResult = test_app.post_subscription(body.clone()).await.json().await.unwrap();
    let second: ActionResult = test_app.post_subscription(body).await.json().await.unwrap();

    assert!(first.success);
    assert!(second.success);
    assert!(second.message.contains("already subscribed"));
    assert_eq!(test_app.subscribers.subscribers().await.len(), 1);
}

#[tokio::test]
async fn subscribe_reactivates_an_unsubscribed_email() {
    let previous = Subscriber {
        id: Uuid::new_v4(),
        email: SubscriberEmail::parse("a@b.com").unwrap(),
        name: None,
        status: SubscriberStatus::Unsubscribed,
        source: String::from("website"),
        subscribed_at: Utc::now() - Duration::days(90),
        welcome_email_sent: true,
    };
    let test_app = TestApp::spawn_app_with_subscribers(InMemorySubscriberStore::with_subscribers(
        vec![previous.clone()],
    ))
    .await;
    mount_email_provider(&test_app, 200).await;

    let response = test_app
        .post_subscription(serde_json::json!({ "email": "a@b.com", "name": "NewName" }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let result: ActionResult = response.json().await.unwrap();
    assert!(result.message.contains("reactivated"));

    let subscribers = test_app.subscribers.subscribers().await;
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0].id, previous.id);
    assert_eq!(subscribers[0].status, SubscriberStatus::Active);
    assert_eq!(subscribers[0].name.as_ref().unwrap().as_ref(), "NewName");
    assert!(subscribers[0].subscribed_at > previous.subscribed_at);
}

#[tokio::test]
async fn subscribe_returns_400_when_body_is_present_but_not_valid() {
    let test_app = TestApp::spawn_app().await;

    // This is a common practice and it is called table-driven tests. In this case, it simulates different kind of possible request bodies
    // where API should return 400.
    let test_cases = vec![
        (serde_json::json!({ "email": "" }), "empty email"),
        (serde_json::json!({ "email": "not-an-email" }), "invalid email"),
        (serde_json::json!({ "email": "frank@test" }), "email without top-level domain"),
    ];

    for (invalid_body, error_message) in test_cases {
        let response = test_app.post_subscription(invalid_body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 status when payload was {}",
            error_message
        );
        let result: ActionResult = response.json().await.unwrap();
        assert!(!result.success);
    }

    assert_eq!(test_app.subscribers.calls(), 0);
}

#[tokio::test]
async fn subscribe_returns_400_when_email_is_missing() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .post_subscription(serde_json::json!({ "name": "Frank" }))
        .await;

    assert_eq!(400, response.status().as_u16());
    let result: ActionResult = response.json().await.unwrap();
    assert!(!result.success);
    assert_eq!(result.message, "Email is required");
    assert_eq!(test_app.subscribers.calls(), 0);
}

#[tokio::test]
async fn subscribe_returns_400_when_body_is_not_json() {
    let test_app = TestApp::spawn_app().await;

    let response = reqwest::Client::new()
        .post(&format!("{}/subscriptions", test_app.address))
        .header("Content-Type", "application/json")
        .body("email=frank@test.com")
        .send()
        .await
        .expect("Failed to execute request.");

    assert_eq!(400, response.status().as_u16());
    let result: ActionResult = response.json().await.unwrap();
    assert!(!result.success);
}

#[tokio::test]
async fn subscribe_accepts_names_with_punctuation() {
    let test_app = TestApp::spawn_app().await;
    mount_email_provider(&test_app, 200).await;

    let response = test_app
        .post_subscription(serde_json::json!({ "email": "ana@farm.org", "name": "Ana (Farm Co)" }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let result: ActionResult = response.json().await.unwrap();
    assert!(result.success);

    let subscribers = test_app.subscribers.subscribers().await;
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0].name.as_ref().unwrap().as_ref(), "Ana (Farm Co)");
}

#[tokio::test]
async fn subscribe_succeeds_when_the_welcome_email_fails() {
    let test_app = TestApp::spawn_app().await;
    mount_email_provider(&test_app, 500).await;

    let response = test_app
        .post_subscription(serde_json::json!({ "email": "frank@test.com" }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let subscribers = test_app.subscribers.subscribers().await;
    assert_eq!(subscribers.len(), 1);
    assert!(!subscribers[0].welcome_email_sent);
}

#[tokio::test]
async fn subscribe_hides_store_failures_behind_a_generic_message() {
    let test_app = TestApp::spawn_app().await;
    test_app.subscribers.set_unavailable(true);

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.email_server)
        .await;

    let response = test_app
        .post_subscription(serde_json::json!({ "email": "frank@test.com" }))
        .await;

    assert_eq!(500, response.status().as_u16());
    let result: ActionResult = response.json().await.unwrap();
    assert!(!result.success);
    assert_eq!(result.message, "Something went wrong. Please try again later.");
}
