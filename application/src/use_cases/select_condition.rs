//! Random assignment of participants to conditions.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use relay_domain::StudyConfig;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectError {
    #[error("No enabled conditions to assign")]
    NoEnabledConditions,
}

/// Pick an enabled condition uniformly at random.
///
/// The same `seed` always picks the same index for the same study.
pub fn select_condition(study: &StudyConfig, seed: Option<u64>) -> Result<usize, SelectError> {
    let enabled = study.enabled_indices();
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let index = *enabled
        .choose(&mut rng)
        .ok_or(SelectError::NoEnabledConditions)?;
    debug!(index, enabled = enabled.len(), "Selected condition");
    Ok(index)
}
