use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::config::{DirectoryConfig, ModelConfig};

#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub logs_dir: PathBuf,
    pub artifact_path: PathBuf,
}

/// Creates the logs directory and pins the artifact path to an absolute one.
/// The artifact itself may be missing; that is reported when the model loads.
pub fn ensure_directories(dirs: &DirectoryConfig, model: &ModelConfig) -> Result<ResolvedPaths> {
    let logs_dir = ensure_dir(&dirs.logs_dir)?;

    let probe_file = logs_dir.join(".write-test");
    fs::write(&probe_file, b"ok")
        .with_context(|| format!("logs directory {} is not writable", logs_dir.display()))?;
    fs::remove_file(&probe_file)?;

    let artifact_path = absolute(&model.artifact_path)?;
    Ok(ResolvedPaths {
        logs_dir,
        artifact_path,
    })
}

fn ensure_dir(path: &str) -> Result<PathBuf> {
    let dir = PathBuf::from(path);
    if !dir.exists() {
        fs::create_dir_all(&dir).with_context(|| format!("failed to create directory {}", path))?;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Ok(metadata) = fs::metadata(&dir) {
            let mut perms = metadata.permissions();
            perms.set_mode(0o755);
            let _ = fs::set_permissions(&dir, perms);
        }
    }
    Ok(dir.canonicalize().unwrap_or(dir))
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().context("failed to read the working directory")?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_config(path: &str) -> ModelConfig {
        ModelConfig {
            artifact_path: PathBuf::from(path),
            max_input_bytes: 1024,
        }
    }

    #[test]
    fn creates_missing_logs_dir() {
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("nested").join("logs");
        let dirs = DirectoryConfig {
            logs_dir: target.to_string_lossy().into_owned(),
        };

        let paths = ensure_directories(&dirs, &model_config("/srv/model.json")).unwrap();
        assert!(paths.logs_dir.is_dir());
        assert!(!paths.logs_dir.join(".write-test").exists());
        assert_eq!(paths.artifact_path, PathBuf::from("/srv/model.json"));
    }

    #[test]
    fn relative_artifact_path_becomes_absolute() {
        let root = tempfile::tempdir().unwrap();
        let dirs = DirectoryConfig {
            logs_dir: root.path().to_string_lossy().into_owned(),
        };

        let paths = ensure_directories(&dirs, &model_config("models/inbox.json")).unwrap();
        assert!(paths.artifact_path.is_absolute());
        assert!(paths.artifact_path.ends_with("models/inbox.json"));
    }
}
