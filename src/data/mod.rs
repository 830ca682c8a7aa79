//! Data layer module
//!
//! Handles all metadata persistence:
//! - Remote managed database (PostgREST)
//! - Local SQLite database (store of last resort)
//! - Legacy JSON mirror

mod database;
mod legacy;
mod models;
mod remote;
mod store;

pub use database::Database;
pub use legacy::LegacyCache;
pub use models::*;
pub use remote::RemoteDatabase;
pub use store::{PodcastStore, StoreChain, Stored};

#[cfg(test)]
pub(crate) use store::testing;

#[cfg(test)]
mod database_test;
