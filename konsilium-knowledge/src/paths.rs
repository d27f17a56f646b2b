use std::path::PathBuf;

use konsilium_core::KnowledgeSettings;

use crate::errors::{KnowledgeError, KnowledgeResult};

/// Resolve the index database location. One file holds every domain's
/// segments so stats and full clears never span directories.
pub fn index_db_path(settings: &KnowledgeSettings) -> KnowledgeResult<PathBuf> {
    if let Some(path) = &settings.db_path_override {
        return Ok(path.clone());
    }
    if let Some(root) = &settings.data_root_override {
        return Ok(root.join("guidelines.sqlite3"));
    }
    let dir = dirs::data_dir().ok_or(KnowledgeError::MissingDataDir)?;
    Ok(dir.join("konsilium").join("guidelines.sqlite3"))
}
