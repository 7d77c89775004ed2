//! Courtyard Application - Executor, sync engine and ports
//!
//! This crate defines the application layer with:
//! - Port traits (transport, credential storage, push platform, feed)
//! - The shared request executor
//! - The notification sync engine and push-token registration
//! - Application-level error handling

pub mod cancellation;
pub mod error;
pub mod executor;
pub mod notifications;
pub mod ports;
pub mod retry;

#[cfg(test)]
mod test_support;

pub use cancellation::CancellationScope;
pub use error::{ApplicationError, ApplicationResult};
pub use executor::{ExecutorConfig, RequestExecutor};
pub use notifications::{
    NotificationApi, NotificationSyncEngine, PollingConfig, PushRegistrar,
    PushRegistrationError, Subscriber, SubscriberResult, SubscriptionHandle,
};
pub use ports::{
    CredentialStore, CredentialStoreError, FileSystem, FileSystemError, ForegroundEvent,
    ForegroundListener, HttpTransport, ListenerHandle, NotificationFeed, PushPermission,
    PushPlatform, PushPlatformError, TransportError,
};
pub use retry::{Backoff, RetryPolicy};
