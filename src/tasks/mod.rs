//! Background Tasks Module
//!
//! Contains the tasks that run alongside request handling.
//!
//! # Tasks
//! - Sweep: purges expired tickers and idle rate-limit buckets at a fixed interval
//! - Ticker poller: feeds one WebSocket stream

mod cleanup;
mod poller;

pub use cleanup::{spawn_sweep_task, sweep_once};
pub use poller::{poll_ticker, StreamMessage};
