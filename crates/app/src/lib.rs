//! Courtyard - resident client core wired for the command line
//!
//! [`Client`] assembles the executor, notification API and sync engine
//! from [`ClientSettings`](courtyard_domain::ClientSettings); [`cli`]
//! maps subcommands onto it.

pub mod cli;
mod client;

pub use client::Client;
