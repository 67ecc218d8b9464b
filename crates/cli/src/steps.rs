//! Turn command-line paths into composite steps.
//!
//! A file becomes one step labelled with its stem. A directory expands to
//! its `*.py` files in name order.

use std::path::{Path, PathBuf};

use scriptrelay_pipeline::CompositeStep;

/// Extension of script files picked up from directories.
pub const SCRIPT_EXTENSION: &str = "py";

#[derive(Debug, thiserror::Error)]
pub enum StepsError {
    #[error("Cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No .py scripts in {}", path.display())]
    EmptyDirectory { path: PathBuf },
}

/// Load every path, in argument order, into steps.
pub async fn load_steps(paths: &[PathBuf]) -> Result<Vec<CompositeStep>, StepsError> {
    let mut steps = Vec::new();
    for path in paths {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| io(path, e))?;
        if metadata.is_dir() {
            let files = scripts_in(path).await?;
            if files.is_empty() {
                return Err(StepsError::EmptyDirectory { path: path.clone() });
            }
            for file in files {
                steps.push(load_step(&file).await?);
            }
        } else {
            steps.push(load_step(path).await?);
        }
    }
    Ok(steps)
}

async fn load_step(path: &Path) -> Result<CompositeStep, StepsError> {
    let payload = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| io(path, e))?;
    let label = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(CompositeStep::new(label, payload))
}

async fn scripts_in(dir: &Path) -> Result<Vec<PathBuf>, StepsError> {
    let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| io(dir, e))?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| io(dir, e))? {
        let path = entry.path();
        let is_script = path.extension().and_then(|ext| ext.to_str()) == Some(SCRIPT_EXTENSION);
        if is_script && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn io(path: &Path, source: std::io::Error) -> StepsError {
    StepsError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn directory_expands_to_sorted_python_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("20_vehicle.py"), "make_car()").unwrap();
        std::fs::write(dir.path().join("10_environment.py"), "make_env()").unwrap();
        std::fs::write(dir.path().join("README.md"), "ignored").unwrap();
        std::fs::create_dir(dir.path().join("nested.py")).unwrap();

        let steps = load_steps(&[dir.path().to_path_buf()]).await.unwrap();

        assert_eq!(
            steps,
            vec![
                CompositeStep::new("10_environment", "make_env()"),
                CompositeStep::new("20_vehicle", "make_car()"),
            ]
        );
    }

    #[tokio::test]
    async fn files_keep_argument_order() {
        let dir = tempfile::tempdir().unwrap();
        let b = dir.path().join("b.py");
        let a = dir.path().join("a.txt");
        std::fs::write(&b, "b").unwrap();
        std::fs::write(&a, "a").unwrap();

        let steps = load_steps(&[b, a]).await.unwrap();
        let labels: Vec<_> = steps.iter().map(|s| s.label.as_deref()).collect();
        assert_eq!(labels, vec![Some("b"), Some("a")]);
    }

    #[tokio::test]
    async fn missing_path_and_empty_directory_are_errors() {
        let dir = tempfile::tempdir().unwrap();

        assert_matches!(
            load_steps(&[dir.path().join("nope.py")]).await,
            Err(StepsError::Io { .. })
        );
        assert_matches!(
            load_steps(&[dir.path().to_path_buf()]).await,
            Err(StepsError::EmptyDirectory { .. })
        );
    }
}
