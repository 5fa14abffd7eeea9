//! 应用驱动 - 编排层
//!
//! ## 职责
//!
//! 命令行入口，负责一次完整会话：
//!
//! 1. **加载文件**：优先读取会话清单，没有清单时扫描输入目录
//! 2. **加入集合**：加入并校验，应用清单里的旋转角度
//! 3. **解锁**：用清单中的密码并发解锁
//! 4. **提交**：遇到 423 时用清单密码重新解锁后再提交，次数受配置限制
//! 5. **输出**：把结果写入输出目录

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use tokio::fs;
use tracing::{error, info, warn};

use crate::clients::PdfApiClient;
use crate::config::Config;
use crate::models::{self, DocumentHandle, SessionManifest, TransformOutput};
use crate::orchestrator::PdfManager;
use crate::store::BlockReason;
use crate::utils::logging::{log_collection_loaded, log_startup, print_final_summary, truncate_text};
use crate::workflow::SubmitOutcome;

/// 应用主结构
pub struct App {
    config: Config,
    manager: PdfManager<PdfApiClient>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        config.validate()?;
        log_startup(&config);

        let client = PdfApiClient::new(&config)?;
        let manager = PdfManager::new(Arc::new(client), config.max_files);

        Ok(Self { config, manager })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        match self.manager.server_status().await {
            Ok(message) => info!("🌐 服务在线: {}", message),
            Err(e) => warn!("⚠️ 服务状态检查失败: {}", e),
        }

        let (manifest, documents) = self.load_session().await?;
        if documents.is_empty() {
            warn!("⚠️ 没有找到待处理的PDF文件，程序结束");
            return Ok(());
        }

        let report = self.manager.add_documents(documents).await?;
        if report.validation_unreachable {
            warn!("⚠️ 无法连接校验服务，所有文件按损坏处理");
        }

        self.apply_manifest_rotations(&manifest).await;
        let names: Vec<String> = manifest
            .documents
            .iter()
            .filter(|d| d.password.is_some())
            .map(|d| models::manifest::file_name_of(&d.path).to_string())
            .collect();
        self.unlock_with_manifest(&manifest, &names).await;

        let tool = manifest.tool.clone();
        let mut attempts = 0;
        let mut saved: Option<String> = None;

        while attempts < self.config.max_submit_attempts {
            self.log_rows().await;
            attempts += 1;
            info!("\n📤 第 {}/{} 次提交 ({})", attempts, self.config.max_submit_attempts, tool.name());

            match self.manager.submit(&tool).await {
                Ok(SubmitOutcome::Succeeded(output)) => {
                    let path = self.write_output(&output).await?;
                    saved = Some(path.display().to_string());
                    break;
                }
                Ok(SubmitOutcome::Recoverable { locked, unattributed }) => {
                    if !unattributed.is_empty() {
                        warn!("⚠️ 服务端报告了不在集合中的文件: {:?}", unattributed);
                    }
                    let retry: Vec<String> = locked
                        .into_iter()
                        .filter(|name| manifest.password_for(name).is_some())
                        .collect();
                    if retry.is_empty() {
                        warn!("⚠️ 加密文件没有可用的密码，无法继续");
                        break;
                    }
                    self.unlock_with_manifest(&manifest, &retry).await;
                }
                Ok(SubmitOutcome::Failed { message }) => {
                    error!("❌ Error: {}", truncate_text(&message, 200));
                    break;
                }
                Err(e) => {
                    error!("❌ 无法提交: {}", e);
                    self.log_blocking().await;
                    break;
                }
            }
        }

        print_final_summary(tool.name(), saved.is_some(), attempts, saved.as_deref());
        Ok(())
    }

    /// 读取会话清单；清单不存在时扫描输入目录
    async fn load_session(&self) -> Result<(SessionManifest, Vec<DocumentHandle>)> {
        let manifest_path = Path::new(&self.config.manifest_path);

        if fs::try_exists(manifest_path).await.unwrap_or(false) {
            info!("\n📁 正在读取会话清单...");
            let manifest = models::load_manifest(manifest_path).await?;
            let documents = models::load_documents(&manifest).await?;
            log_collection_loaded(documents.len(), &self.config.manifest_path);
            return Ok((manifest, documents));
        }

        info!("\n📁 未找到会话清单，扫描 {}", self.config.input_folder);
        let documents = models::load_pdf_folder(&self.config.input_folder).await?;
        log_collection_loaded(documents.len(), &self.config.input_folder);
        Ok((SessionManifest::default(), documents))
    }

    async fn apply_manifest_rotations(&self, manifest: &SessionManifest) {
        for doc in manifest.documents.iter().filter(|d| !d.rotation.is_zero()) {
            let name = models::manifest::file_name_of(&doc.path);
            if let Err(e) = self.manager.set_rotation(name, doc.rotation).await {
                warn!("[{}] ⚠️ 无法设置旋转: {}", name, e);
            }
        }
    }

    /// 用清单中的密码并发解锁
    async fn unlock_with_manifest(&self, manifest: &SessionManifest, names: &[String]) {
        let attempts = names.iter().filter_map(|name| {
            let password = manifest.password_for(name)?;
            Some(async move { (name, self.manager.unlock(name, password).await) })
        });

        for (name, result) in join_all(attempts).await {
            if let Err(e) = result {
                warn!("[{}] ⚠️ 解锁失败: {}", name, e);
            }
        }
    }

    async fn log_rows(&self) {
        for row in self.manager.rows().await {
            info!("{}", row);
        }
        if let Some(banner) = self.manager.banner().await {
            warn!("{}", banner);
        }
    }

    async fn log_blocking(&self) {
        let snapshot = self.manager.snapshot().await;
        for (name, reason) in snapshot.blocking_reasons() {
            match reason {
                BlockReason::Broken(reason) => warn!("[{}] ⚠️ 文件损坏: {}", name, reason),
                BlockReason::Locked => warn!("[{}] 🔒 需要密码", name),
                BlockReason::PasswordUnverified => warn!("[{}] 🔑 密码尚未验证", name),
            }
        }
    }

    /// 写入结果文件
    async fn write_output(&self, output: &TransformOutput) -> Result<PathBuf> {
        let dir = PathBuf::from(&self.config.output_dir);
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("无法创建输出目录: {}", dir.display()))?;

        let file_name = models::manifest::file_name_of(&output.file_name);
        let path = dir.join(file_name);
        fs::write(&path, &output.content)
            .await
            .with_context(|| format!("无法写入结果文件: {}", path.display()))?;

        info!("💾 已保存: {} ({} 字节)", path.display(), output.content.len());
        Ok(path)
    }
}
