//! Records user activity events and reports the working time elapsed since
//! the user's anchor event.
//!
//! ```ignore
//! use lambda_runtime::{service_fn, LambdaEvent};
//! use ledger_in_memory::InMemoryLedgerStore;
//! use recorder::{activity_fn, ActivityRecorder, RecorderConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), model::Error> {
//!     let recorder: ActivityRecorder =
//!         ActivityRecorder::new(Arc::new(InMemoryLedgerStore::default()), RecorderConfig::from_env()?);
//!
//!     lambda_runtime::run(service_fn(|event| activity_fn(&recorder, event))).await
//! }
//! ```

pub mod config;
mod error;
mod handler;
mod recorder;
mod selection;

pub use crate::config::{RecorderConfig, SelectionPolicy, WriteStatusPolicy};
pub use crate::error::RecorderError;
pub use crate::handler::activity_fn;
pub use crate::recorder::{parse_request, ActivityRecorder};
pub use crate::selection::working_time;
