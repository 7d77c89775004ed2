//! Command line interface.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use courtyard_application::{
    ApplicationError, ApplicationResult, HttpTransport, SubscriberResult,
};
use courtyard_domain::{CredentialScope, SyncCycle};
use courtyard_infrastructure::StaticPushPlatform;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::Client;

/// Resident client for the Courtyard society backend.
#[derive(Debug, Parser)]
#[command(name = "courtyard", author, version, about)]
pub struct Cli {
    /// Settings file. Defaults to `<config dir>/courtyard/settings.toml`.
    #[arg(long, global = true, env = "COURTYARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Which stored session a credential belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    /// Resident session.
    Resident,
    /// Admin session.
    Admin,
}

impl From<ScopeArg> for CredentialScope {
    fn from(value: ScopeArg) -> Self {
        match value {
            ScopeArg::Resident => Self::Standard,
            ScopeArg::Admin => Self::Elevated,
        }
    }
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store a session token
    Login {
        /// Session the token belongs to.
        #[arg(long, value_enum, default_value_t = ScopeArg::Resident)]
        scope: ScopeArg,
        /// Bearer token issued by the login endpoint.
        #[arg(long)]
        token: String,
    },
    /// Forget a session token
    Logout {
        /// Session to forget.
        #[arg(long, value_enum, default_value_t = ScopeArg::Resident)]
        scope: ScopeArg,
        /// Forget both sessions.
        #[arg(long, conflicts_with = "scope")]
        all: bool,
    },
    /// Poll notifications and print every cycle until Ctrl-C
    Poll {
        /// Stop after this many cycles.
        #[arg(long)]
        cycles: Option<u32>,
    },
    /// Print the unread notification count
    Unread,
    /// Mark one notification as read
    #[command(name = "mark-read")]
    MarkRead {
        /// Notification id.
        id: String,
    },
    /// Mark every notification as read
    #[command(name = "mark-all-read")]
    MarkAllRead,
    /// Delete one notification
    Delete {
        /// Notification id.
        id: String,
    },
    /// Register a device token for push delivery
    #[command(name = "register-push")]
    RegisterPush {
        /// Token issued by the device's push service.
        #[arg(long)]
        device_token: String,
    },
}

impl Command {
    /// Runs the command against `client`, printing results to stdout.
    ///
    /// # Errors
    ///
    /// Returns the underlying request, credential or push failure.
    pub async fn run<T: HttpTransport + 'static>(
        self,
        client: &Client<T>,
    ) -> ApplicationResult<()> {
        match self {
            Self::Login { scope, token } => {
                client
                    .executor()
                    .store_credential(scope.into(), &token)
                    .await?;
                println!("Stored {scope:?} credential");
            }
            Self::Logout { all: true, .. } => {
                client.executor().clear_all_credentials().await?;
                println!("Cleared all credentials");
            }
            Self::Logout { scope, all: false } => {
                client.executor().clear_credential(scope.into()).await?;
                println!("Cleared {scope:?} credential");
            }
            Self::Poll { cycles } => poll(client, cycles).await,
            Self::Unread => {
                let count = client.notifications().unread_count().await?;
                println!("{count}");
            }
            Self::MarkRead { id } => {
                client.notifications().mark_read(&id).await?;
                println!("Marked {id} as read");
            }
            Self::MarkAllRead => {
                client.notifications().mark_all_read().await?;
                println!("Marked all notifications as read");
            }
            Self::Delete { id } => {
                client.notifications().delete(&id).await?;
                println!("Deleted {id}");
            }
            Self::RegisterPush { device_token } => {
                let platform = Arc::new(StaticPushPlatform::granted(device_token));
                let engine = client.sync_engine(Some(platform));
                match engine.register_for_push_notifications().await? {
                    Some(token) => println!("Registered push token {token}"),
                    None => println!("Push notifications are not permitted"),
                }
            }
        }
        Ok(())
    }
}

async fn poll<T: HttpTransport + 'static>(client: &Client<T>, cycles: Option<u32>) {
    let engine = client.sync_engine(None);
    let (tx, mut rx) = mpsc::unbounded_channel();
    engine
        .start_polling(Arc::new(move |cycle: &SyncCycle| -> SubscriberResult {
            tx.send(cycle.clone())?;
            Ok(())
        }))
        .await;

    let mut seen = 0u32;
    loop {
        tokio::select! {
            received = rx.recv() => {
                let Some(cycle) = received else { break };
                seen += 1;
                println!("{}", describe(seen, &cycle));
                if cycles.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "Could not listen for Ctrl-C");
                }
                info!("Interrupted");
                break;
            }
        }
    }
    engine.stop_polling();
}

/// Extra guidance printed after a failure that only a new login fixes.
#[must_use]
pub fn login_hint(error: &ApplicationError) -> Option<&'static str> {
    match error {
        ApplicationError::Request(failure) if failure.kind.requires_login() => {
            Some("Sign in again with `courtyard login --token <TOKEN>`.")
        }
        _ => None,
    }
}

fn describe(index: u32, cycle: &SyncCycle) -> String {
    let mut line = format!(
        "#{index} unread={} notifications={} announcements={}",
        cycle.unread_count,
        cycle.notifications.len(),
        cycle.announcements.len()
    );
    if cycle.has_changes {
        line.push_str(" changed");
    }
    if !cycle.stale_slices.is_empty() {
        let stale: Vec<String> = cycle.stale_slices.iter().map(ToString::to_string).collect();
        line.push_str(&format!(" stale={}", stale.join(",")));
    }
    line
}
