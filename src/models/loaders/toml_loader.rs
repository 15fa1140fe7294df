use crate::error::FileError;
use crate::models::manifest::AssignmentManifest;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载作业清单
pub async fn load_manifest(toml_file_path: &Path) -> Result<AssignmentManifest> {
    let path_text = toml_file_path.display().to_string();
    let content = fs::read_to_string(toml_file_path)
        .await
        .map_err(|e| FileError::read_failed(path_text.clone(), e))?;

    let mut manifest: AssignmentManifest =
        toml::from_str(&content).map_err(|source| FileError::TomlParseFailed {
            path: path_text,
            source,
        })?;

    // 设置文件路径，用于解析相对路径
    manifest.file_path = Some(toml_file_path.to_path_buf());

    Ok(manifest)
}

/// 从文件夹中加载所有作业清单
///
/// 无法解析的清单记录警告后跳过；结果按文件名排序。
pub async fn load_all_manifests(folder_path: &str) -> Result<Vec<AssignmentManifest>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        return Err(FileError::DirectoryNotFound {
            path: folder_path.to_string(),
        }
        .into());
    }

    let mut toml_files = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            toml_files.push(path);
        }
    }
    toml_files.sort();

    let mut manifests = Vec::new();
    for path in toml_files {
        tracing::info!(
            "正在加载: {}",
            path.file_name().unwrap_or_default().to_string_lossy()
        );

        match load_manifest(&path).await {
            Ok(manifest) => {
                tracing::info!("成功加载 {} 份提交", manifest.submissions.len());
                manifests.push(manifest);
            }
            Err(e) => {
                tracing::warn!("加载文件失败 {}: {:#}", path.display(), e);
            }
        }
    }

    Ok(manifests)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_all_manifests_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b.toml"),
            "name = \"b\"\nowner = \"o\"\n[submissions]\no = \"o.ipynb\"\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("a.toml"), "this is = = not toml").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let folder = dir.path().to_string_lossy().to_string();
        let manifests = tokio_test::block_on(load_all_manifests(&folder)).unwrap();

        assert_eq!(manifests.len(), 1);
        assert_eq!(manifests[0].name, "b");
        assert_eq!(manifests[0].base_dir(), dir.path());
    }

    #[test]
    fn test_missing_folder_is_an_error() {
        let result = tokio_test::block_on(load_all_manifests("/definitely/not/here"));
        assert!(result.is_err());
    }
}
