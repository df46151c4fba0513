mod downloads;
mod subscriptions;
mod unsubscribe;
