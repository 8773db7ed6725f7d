//! Write path of the probe: the retry loop and the run driver on top of it

pub mod controller;
pub mod writer;

pub use controller::{RunController, RunMode, RunReport};
pub use writer::{RetryPolicy, RetryPolicyBuilder, WriteOutcome, WriteRetryLoop};
