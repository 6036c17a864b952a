//! Read-through cache of study documents.
//!
//! A study file is read at most once per distinct path for the life of the
//! cache. Concurrent first readers of the same path wait on a single load.

use crate::ports::study_config_source::{StudyConfigError, StudyConfigSource};
use relay_domain::StudyConfig;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;
use tracing::{debug, info};

type Slot = Arc<OnceCell<Arc<StudyConfig>>>;

pub struct StudyConfigCache {
    source: Arc<dyn StudyConfigSource>,
    slots: Mutex<HashMap<PathBuf, Slot>>,
}

impl StudyConfigCache {
    pub fn new(source: Arc<dyn StudyConfigSource>) -> Self {
        Self {
            source,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Return the study at `path`, loading it on first use.
    ///
    /// A failed load leaves the slot empty, so the next call tries again.
    pub async fn get(&self, path: &Path) -> Result<Arc<StudyConfig>, StudyConfigError> {
        let slot = self.slot(path);
        let config = slot
            .get_or_try_init(|| async {
                let config = self.source.load(path).await?;
                info!(
                    path = %path.display(),
                    conditions = config.len(),
                    "Loaded study configuration"
                );
                Ok::<_, StudyConfigError>(Arc::new(config))
            })
            .await?;
        debug!(path = %path.display(), "Study configuration served from cache");
        Ok(Arc::clone(config))
    }

    /// Number of paths with a loaded study.
    pub fn loaded(&self) -> usize {
        self.lock()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }

    fn slot(&self, path: &Path) -> Slot {
        Arc::clone(self.lock().entry(path.to_path_buf()).or_default())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Slot>> {
        // The map is only touched in short non-panicking sections.
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
