//! Retry domain.
//!
//! - [`policy::RetryPolicy`] — attempt outcome → next step
//! - [`policy::ErrorKind`] — classified attempt failures

pub mod policy;
