//! Writers for the run's output files.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::composer::ComposedIdea;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize ideas: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn write_file(path: &Path, contents: &str) -> Result<(), ExportError> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, contents).map_err(io_err)
}

/// Write one `- <item>` line per item.
pub fn export_markdown<S: AsRef<str>>(items: &[S], path: &Path) -> Result<(), ExportError> {
    let body: String = items
        .iter()
        .map(|item| format!("- {}\n", item.as_ref()))
        .collect();
    write_file(path, &body)?;
    info!(path = %path.display(), count = items.len(), "Exported markdown");
    Ok(())
}

/// Write the composed ideas as a pretty-printed JSON array.
pub fn export_json(ideas: &[ComposedIdea], path: &Path) -> Result<(), ExportError> {
    let body = serde_json::to_string_pretty(ideas)?;
    write_file(path, &body)?;
    info!(path = %path.display(), count = ideas.len(), "Exported JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composer::compose;
    use serde_json::json;

    #[test]
    fn export_markdown_writes_exact_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ideas.md");

        export_markdown(&["First idea", "Second idea"], &path).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "- First idea\n- Second idea\n"
        );
    }

    #[test]
    fn export_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/ideas.md");

        export_markdown::<&str>(&[], &path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn export_json_is_readable_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ideas.json");
        let ideas = compose(&[json!({"title": "A"}), json!({"title": "B"})]);

        export_json(&ideas, &path).unwrap();

        let back: Vec<ComposedIdea> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, ideas);
    }
}
