//! Study configuration domain.
//!
//! - [`entities::StudyConfig`] — conditions plus study-wide defaults
//! - [`resolver::resolve_condition`] — merge one condition into a [`resolved::ResolvedConfig`]
//! - [`identity`] — identity protection instructions

pub mod entities;
pub mod error;
pub mod identity;
pub mod resolved;
pub mod resolver;
