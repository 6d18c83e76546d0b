//! Session repository adapters

mod jsonl;
mod memory;

pub use jsonl::JsonlSessionRepository;
pub use memory::InMemorySessionRepository;

use crate::config::{FilePersistenceConfig, PersistenceBackend};
use roundtable_application::{PersistenceError, SessionRepository};
use std::sync::Arc;
use tracing::info;

/// Build the repository selected by `[persistence]`
pub fn build_repository(
    config: &FilePersistenceConfig,
) -> Result<Arc<dyn SessionRepository>, PersistenceError> {
    match config.backend {
        PersistenceBackend::Memory => Ok(Arc::new(InMemorySessionRepository::new())),
        PersistenceBackend::Jsonl => {
            let dir = config.resolved_dir().ok_or_else(|| {
                PersistenceError::Unavailable("no session directory configured".to_string())
            })?;
            let repository = JsonlSessionRepository::new(&dir)?;
            info!("Persisting sessions to {}", dir.display());
            Ok(Arc::new(repository))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_jsonl_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("sessions");
        let config = FilePersistenceConfig {
            backend: PersistenceBackend::Jsonl,
            dir: Some(target.clone()),
        };
        let repository = build_repository(&config).unwrap();
        assert!(target.is_dir());
        assert!(repository.list_sessions(None).unwrap().is_empty());
    }
}
