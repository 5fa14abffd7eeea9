use crate::models::document::DocumentHandle;
use crate::models::manifest::{file_name_of, SessionManifest};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 从 TOML 文件加载会话清单
pub async fn load_manifest(manifest_path: &Path) -> Result<SessionManifest> {
    let content = fs::read_to_string(manifest_path)
        .await
        .with_context(|| format!("无法读取清单文件: {}", manifest_path.display()))?;

    let mut manifest: SessionManifest = toml::from_str(&content)
        .with_context(|| format!("无法解析清单文件: {}", manifest_path.display()))?;

    manifest.file_path = Some(manifest_path.to_string_lossy().to_string());

    Ok(manifest)
}

/// 读取清单中登记的所有文档
///
/// 相对路径以清单所在目录为基准。任何一个文件读取失败都会使整体失败，
/// 保证不会悄悄少处理文件。
pub async fn load_documents(manifest: &SessionManifest) -> Result<Vec<DocumentHandle>> {
    let base_dir = manifest
        .file_path
        .as_deref()
        .and_then(|p| Path::new(p).parent())
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut handles = Vec::with_capacity(manifest.documents.len());
    for doc in &manifest.documents {
        let path = resolve(&base_dir, &doc.path);
        let content = fs::read(&path)
            .await
            .with_context(|| format!("无法读取PDF文件: {}", path.display()))?;
        handles.push(DocumentHandle::new(file_name_of(&doc.path), content));
    }

    Ok(handles)
}

/// 加载文件夹中所有 PDF 文件，按文件名排序
pub async fn load_pdf_folder(folder_path: &str) -> Result<Vec<DocumentHandle>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut paths = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_pdf = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf {
            paths.push(path);
        }
    }
    paths.sort();

    let mut handles = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        tracing::info!("正在加载: {}", name);

        match fs::read(&path).await {
            Ok(content) => handles.push(DocumentHandle::new(name, content)),
            Err(e) => tracing::warn!("加载文件失败 {}: {}", path.display(), e),
        }
    }

    Ok(handles)
}

fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
