//! Write side of the accounting ledger.
//!
//! Every command is a two-step saga:
//! 1. Apply the change to the local projection
//! 2. Publish the resulting event to the event store
//!
//! If step 2 fails, step 1 is compensated. A failed compensation leaves the
//! local projection out of step with the log and halts the processor.

pub mod compensation;
pub mod error;
pub mod processor;
pub mod state;

pub use compensation::Compensation;
pub use error::{Result, SagaError};
pub use processor::{CommandProcessor, CommandReceipt};
pub use state::SagaState;
