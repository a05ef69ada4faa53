#![forbid(unsafe_code)]

pub mod error;
pub mod ledger;
pub mod model;
pub mod time;
pub mod violation;

pub use error::Error;
pub use time::{Clock, Countdown, Tick};
