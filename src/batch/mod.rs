//! Batch Creation Module
//!
//! This module handles grouping pending claims into batches:
//! - BatchBuilder: Reserves pending claims and materializes them into a directory artifact
//! - BatchScheduler: Fires build requests on a fixed interval

mod builder;
mod scheduler;


pub use builder::BatchBuilder;
pub use scheduler::BatchScheduler;
