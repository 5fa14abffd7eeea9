//! 会话清单
//!
//! 描述一次会话要处理哪些文件、已知密码和旋转角度：
//!
//! ```toml
//! [tool]
//! kind = "merge"
//!
//! [[documents]]
//! path = "a.pdf"
//!
//! [[documents]]
//! path = "b.pdf"
//! password = "secret"
//! rotation = 90
//! ```

use super::document::Rotation;
use crate::workflow::Transform;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionManifest {
    #[serde(default)]
    pub tool: Transform,
    #[serde(default)]
    pub documents: Vec<ManifestDocument>,
    #[serde(skip_serializing, skip_deserializing)]
    pub file_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestDocument {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub rotation: Rotation,
}

impl SessionManifest {
    /// 按文件名查找清单里登记的密码
    pub fn password_for(&self, name: &str) -> Option<&str> {
        self.documents
            .iter()
            .find(|d| file_name_of(&d.path) == name)
            .and_then(|d| d.password.as_deref())
    }
}

/// 路径的最后一段，作为文档身份
pub fn file_name_of(path: &str) -> &str {
    std::path::Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_from_toml() {
        let manifest: SessionManifest = toml::from_str(
            r#"
            [tool]
            kind = "merge"

            [[documents]]
            path = "in/a.pdf"

            [[documents]]
            path = "in/b.pdf"
            password = "secret"
            rotation = 270
            "#,
        )
        .unwrap();

        assert_eq!(manifest.tool, Transform::Merge);
        assert_eq!(manifest.documents.len(), 2);
        assert_eq!(manifest.documents[1].rotation.degrees(), 270);
        assert_eq!(manifest.password_for("b.pdf"), Some("secret"));
        assert_eq!(manifest.password_for("a.pdf"), None);
    }

    #[test]
    fn test_manifest_rejects_odd_rotation() {
        let result: Result<SessionManifest, _> = toml::from_str(
            r#"
            [[documents]]
            path = "a.pdf"
            rotation = 45
            "#,
        );
        assert!(result.is_err());
    }
}
