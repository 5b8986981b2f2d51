//! Scrapes an airing schedule, keeps a catalog of shows in SQLite and tracks
//! which users follow which show.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod schedule;
pub mod services;

pub use app::{App, ReleaseNotice, SubscribeOutcome};
pub use config::Config;
pub use error::{AppError, Result};
