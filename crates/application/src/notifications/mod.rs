//! Notification reads, the polling sync engine and push registration.

mod api;
mod engine;
mod push;

pub use api::NotificationApi;
pub use engine::{
    NotificationSyncEngine, PollingConfig, Subscriber, SubscriberResult, SubscriptionHandle,
};
pub use push::{PushRegistrar, PushRegistrationError};
