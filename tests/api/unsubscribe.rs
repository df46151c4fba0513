use chrono::Utc;
use uuid::Uuid;

use crate::helpers::TestApp;
use farm_association_site::{
    domain::subscriber::Subscriber, domain::subscriber_email::SubscriberEmail,
    domain::subscriber_status::SubscriberStatus,
    services::subscription_manager::ActionResult,
    store::in_memory::InMemorySubscriberStore,
};

fn active_subscriber(email: &str) -> Subscriber {
    Subscriber {
        id: Uuid::new_v4(),
        email: SubscriberEmail::parse(email).unwrap(),
        name: None,
        status: SubscriberStatus::Active,
        source: String::from("website"),
        subscribed_at: Utc::now(),
        welcome_email_sent: true,
    }
}

#[tokio::test]
async fn unsubscribe_marks_the_subscriber_as_unsubscribed() {
    let test_app = TestApp::spawn_app_with_subscribers(InMemorySubscriberStore::with_subscribers(
        vec![active_subscriber("frank@test.com")],
    ))
    .await;

    let response = test_app
        .post_unsubscribe(serde_json::json!({ "email": "Frank@Test.com" }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let result: ActionResult = response.json().await.unwrap();
    assert!(result.success);

    let subscribers = test_app.subscribers.subscribers().await;
    assert_eq!(subscribers.len(), 1);
    assert_eq!(subscribers[0].status, SubscriberStatus::Unsubscribed);
}

#[tokio::test]
async fn unsubscribe_of_an_unknown_email_returns_404() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .post_unsubscribe(serde_json::json!({ "email": "ghost@nowhere.com" }))
        .await;

    assert_eq!(404, response.status().as_u16());
    let result: ActionResult = response.json().await.unwrap();
    assert!(!result.success);
    assert!(result.message.contains("not found"));
    assert!(test_app.subscribers.subscribers().await.is_empty());
}

#[tokio::test]
async fn unsubscribe_returns_400_for_invalid_emails() {
    let test_app = TestApp::spawn_app().await;

    for email in ["", "not-an-email"] {
        let response = test_app
            .post_unsubscribe(serde_json::json!({ "email": email }))
            .await;

        assert_eq!(400, response.status().as_u16());
    }

    assert_eq!(test_app.subscribers.calls(), 0);
}

#[tokio::test]
async fn unsubscribe_returns_400_when_email_is_missing() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app.post_unsubscribe(serde_json::json!({})).await;

    assert_eq!(400, response.status().as_u16());
    let result: ActionResult = response.json().await.unwrap();
    assert!(!result.success);
    assert_eq!(test_app.subscribers.calls(), 0);
}
