use actix_web::error::JsonPayloadError;
use actix_web::{web, HttpRequest, HttpResponse};

use crate::domain::new_subscriber::{NewSubscriberBody, UnsubscribeBody};
use crate::services::subscription_manager::{
    ActionResult, SubscriptionError, SubscriptionManager,
};

#[tracing::instrument(
    name = "Creating a new subscriber handler",
    skip(body, subscription_manager),
    fields(
        subscriber_email = %body.email,
    )
)]
pub async fn handle_create_subscription(
    body: web::Json<NewSubscriberBody>,
    subscription_manager: web::Data<SubscriptionManager>,
) -> Result<HttpResponse, SubscriptionError> {
    let outcome = subscription_manager
        .subscribe(&body.email, body.name.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(ActionResult::from(outcome)))
}

#[tracing::instrument(
    name = "Unsubscribe handler",
    skip(body, subscription_manager),
    fields(
        subscriber_email = %body.email,
    )
)]
pub async fn handle_unsubscribe(
    body: web::Json<UnsubscribeBody>,
    subscription_manager: web::Data<SubscriptionManager>,
) -> Result<HttpResponse, SubscriptionError> {
    let outcome = subscription_manager.unsubscribe(&body.email).await?;

    Ok(HttpResponse::Ok().json(ActionResult::from(outcome)))
}

/// Bodies that cannot be read as JSON, or that lack the email field, answer with the same
/// `{ success, message }` shape as any other validation failure.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    tracing::debug!(error = %err, "Rejected a subscription request body");

    SubscriptionError::Validation(String::from("Email is required")).into()
}
