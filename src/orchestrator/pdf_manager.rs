//! 文档集合管理器 - 编排层
//!
//! ## 职责
//!
//! 集合状态的唯一持有者。所有修改都经过这里：
//!
//! 1. **加锁取快照**：读出要发送的文件和票据
//! 2. **释放锁做 I/O**：校验、密码检查、提交都不持有锁
//! 3. **重新加锁回写**：只通过票据回写，文件已删除时结果直接丢弃
//!
//! 校验结果只写 `broken`，密码检查只写 `locked` / `verified`，
//! 两者并发时互不覆盖。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clients::PdfApi;
use crate::error::{ApiError, AppError, CollectionError};
use crate::models::{DocumentHandle, Rotation};
use crate::services::{LockCheck, LockDiscovery, Preview, PreviewRenderer, ValidationService};
use crate::store::CollectionState;
use crate::view::{self, FileRow, StatusBanner};
use crate::workflow::submission::{self, SubmissionWorkflow, SubmitOutcome};
use crate::workflow::Transform;

/// 提交状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionPhase {
    #[default]
    Idle,
    Submitting,
}

/// 一次添加的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddReport {
    /// 实际加入的文件（已存在的同名文件不计）
    pub admitted: Vec<String>,
    /// 本批中被判定为损坏的文件
    pub broken: Vec<String>,
    /// 校验请求本身是否失败
    pub validation_unreachable: bool,
}

/// 预览失败后的加密探测结论
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewDiagnosis {
    /// 服务端确认文件加密，已标记
    Locked,
    /// 文件能打开，预览失败另有原因
    NotEncrypted,
    /// 已经是加密或损坏状态，没有发起探测
    Skipped,
    /// 探测期间文件被删除，结果已丢弃
    Discarded,
}

/// 提交期间持有，离开作用域时（包括 future 被丢弃）把状态恢复为空闲
struct SubmittingGuard<'a>(&'a AtomicBool);

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 文档集合管理器
pub struct PdfManager<A> {
    api: Arc<A>,
    collection: Mutex<CollectionState>,
    /// 只在持有 `collection` 锁时置位
    submitting: AtomicBool,
    validation: ValidationService<A>,
    lock_discovery: LockDiscovery<A>,
    submission: SubmissionWorkflow<A>,
}

impl<A: PdfApi> PdfManager<A> {
    pub fn new(api: Arc<A>, max_files: usize) -> Self {
        Self {
            validation: ValidationService::new(api.clone()),
            lock_discovery: LockDiscovery::new(api.clone()),
            submission: SubmissionWorkflow::new(api.clone()),
            collection: Mutex::new(CollectionState::new(max_files)),
            submitting: AtomicBool::new(false),
            api,
        }
    }

    // ========== 查询 ==========

    /// 当前集合的完整拷贝
    pub async fn snapshot(&self) -> CollectionState {
        self.collection.lock().await.clone()
    }

    pub async fn is_ready(&self) -> bool {
        self.collection.lock().await.is_ready()
    }

    pub async fn phase(&self) -> SubmissionPhase {
        if self.submitting.load(Ordering::SeqCst) {
            SubmissionPhase::Submitting
        } else {
            SubmissionPhase::Idle
        }
    }

    fn ensure_idle(&self) -> Result<(), CollectionError> {
        if self.submitting.load(Ordering::SeqCst) {
            Err(CollectionError::SubmissionInFlight)
        } else {
            Ok(())
        }
    }

    /// 按展示顺序生成文件行
    pub async fn rows(&self) -> Vec<FileRow> {
        view::render_rows(&*self.collection.lock().await)
    }

    pub async fn banner(&self) -> Option<StatusBanner> {
        view::banner(&*self.collection.lock().await)
    }

    /// 服务状态
    pub async fn server_status(&self) -> Result<String, ApiError> {
        self.api.health().await
    }

    // ========== 集合修改 ==========

    /// 加入一批文件并校验其中新加入的部分
    ///
    /// 超过上限时整批拒绝，不发起任何请求。
    pub async fn add_documents(&self, handles: Vec<DocumentHandle>) -> Result<AddReport, CollectionError> {
        let (tickets, batch) = {
            let mut collection = self.collection.lock().await;
            self.ensure_idle()?;
            let tickets = collection.add(handles)?;
            let batch: Vec<DocumentHandle> = tickets
                .iter()
                .filter_map(|t| collection.handle(&t.name).cloned())
                .collect();
            (tickets, batch)
        };

        if batch.is_empty() {
            debug!("没有新文件需要校验");
            return Ok(AddReport::default());
        }
        info!("📥 加入 {} 个文件，开始校验", batch.len());

        let outcome = self.validation.validate_batch(&batch).await;

        let mut collection = self.collection.lock().await;
        let applied = outcome.apply_to(&mut collection, &tickets);
        let broken: Vec<String> = tickets
            .iter()
            .filter(|t| {
                collection.is_current(t)
                    && collection
                        .entry(&t.name)
                        .map(|e| e.is_broken())
                        .unwrap_or(false)
            })
            .map(|t| t.name.clone())
            .collect();

        if applied > 0 {
            warn!("⚠️ {} 个文件未通过校验: {:?}", applied, broken);
        } else {
            info!("✓ {} 个文件全部通过校验", batch.len());
        }

        Ok(AddReport {
            admitted: tickets.into_iter().map(|t| t.name).collect(),
            broken,
            validation_unreachable: outcome.transport_failed,
        })
    }

    /// 删除文件及其全部元数据
    pub async fn remove(&self, name: &str) -> Result<DocumentHandle, CollectionError> {
        let mut collection = self.collection.lock().await;
        self.ensure_idle()?;
        let handle = collection.remove(name)?;
        info!("[{}] 🗑️ 已移除", name);
        Ok(handle)
    }

    pub async fn rotate(&self, name: &str) -> Result<Rotation, CollectionError> {
        let mut collection = self.collection.lock().await;
        self.ensure_idle()?;
        let rotation = collection.rotate(name)?;
        debug!("[{}] 旋转至 {}", name, rotation);
        Ok(rotation)
    }

    pub async fn set_rotation(&self, name: &str, rotation: Rotation) -> Result<(), CollectionError> {
        let mut collection = self.collection.lock().await;
        self.ensure_idle()?;
        collection.set_rotation(name, rotation)
    }

    pub async fn reorder(&self, new_order: &[usize]) -> Result<(), CollectionError> {
        let mut collection = self.collection.lock().await;
        self.ensure_idle()?;
        collection.reorder(new_order)
    }

    pub async fn move_document(&self, from: usize, to: usize) -> Result<(), CollectionError> {
        let mut collection = self.collection.lock().await;
        self.ensure_idle()?;
        collection.move_document(from, to)
    }

    /// 清空集合
    pub async fn reset(&self) -> Result<(), CollectionError> {
        let mut collection = self.collection.lock().await;
        self.ensure_idle()?;
        collection.reset();
        Ok(())
    }

    // ========== 加密处理 ==========

    /// 用户输入密码解锁
    ///
    /// 密码正确时记录密码、标记已验证并解除加密；密码错误时集合不做任何修改，
    /// 错误信息通过 [`CollectionError::PasswordRejected`] 返回。
    pub async fn unlock(&self, name: &str, password: &str) -> Result<(), AppError> {
        let (ticket, handle) = {
            let collection = self.collection.lock().await;
            self.ensure_idle()?;
            let not_found = || CollectionError::NotFound {
                name: name.to_string(),
            };
            let ticket = collection.ticket(name).ok_or_else(not_found)?;
            let handle = collection.handle(name).cloned().ok_or_else(not_found)?;
            (ticket, handle)
        };

        let check = self.lock_discovery.check(&handle, Some(password)).await?;

        match check {
            LockCheck::Opens => {
                let mut collection = self.collection.lock().await;
                // 检查期间开始了提交，结果丢弃，以免与这次提交的 423 交错
                self.ensure_idle()?;
                if collection.apply_verified(&ticket, Some(password)) {
                    info!("[{}] ✓ 密码验证通过", name);
                    Ok(())
                } else {
                    debug!("[{}] 验证期间文件已被移除，结果丢弃", name);
                    Err(CollectionError::NotFound {
                        name: name.to_string(),
                    }
                    .into())
                }
            }
            LockCheck::Rejected { message } => {
                warn!("[{}] ❌ 密码错误: {}", name, message);
                Err(CollectionError::PasswordRejected {
                    name: name.to_string(),
                    message,
                }
                .into())
            }
        }
    }

    /// 预览失败后询问服务端文件是否真的加密
    ///
    /// 已经加密或损坏的文件不再探测。探测时带上已验证的密码（如果有）。
    pub async fn report_preview_failure(&self, name: &str) -> Result<PreviewDiagnosis, AppError> {
        let (ticket, handle, password) = {
            let collection = self.collection.lock().await;
            let not_found = || CollectionError::NotFound {
                name: name.to_string(),
            };
            let entry = collection.entry(name).ok_or_else(not_found)?;
            if entry.locked || entry.is_broken() {
                return Ok(PreviewDiagnosis::Skipped);
            }
            let password = entry.verified_password().map(str::to_string);
            let ticket = collection.ticket(name).ok_or_else(not_found)?;
            let handle = collection.handle(name).cloned().ok_or_else(not_found)?;
            (ticket, handle, password)
        };

        let check = self.lock_discovery.check(&handle, password.as_deref()).await?;

        let mut collection = self.collection.lock().await;
        if !collection.is_current(&ticket) {
            return Ok(PreviewDiagnosis::Discarded);
        }
        if check.is_verified() {
            return Ok(PreviewDiagnosis::NotEncrypted);
        }
        collection.apply_locked(&ticket);
        info!("[{}] 🔒 确认为加密文件", name);
        Ok(PreviewDiagnosis::Locked)
    }

    /// 生成首页预览；失败时触发加密探测后再返回错误
    pub async fn render_preview(&self, name: &str, renderer: &dyn PreviewRenderer) -> Result<Preview, AppError> {
        let (handle, password) = {
            let collection = self.collection.lock().await;
            let handle = collection
                .handle(name)
                .cloned()
                .ok_or_else(|| CollectionError::NotFound {
                    name: name.to_string(),
                })?;
            let password = collection
                .entry(name)
                .and_then(|e| e.password.clone());
            (handle, password)
        };

        match renderer.render(&handle, password.as_deref()).await {
            Ok(preview) => Ok(preview),
            Err(e) => {
                debug!("[{}] 预览失败: {}", name, e);
                match self.report_preview_failure(name).await {
                    Ok(diagnosis) => debug!("[{}] 探测结论: {:?}", name, diagnosis),
                    Err(probe) => warn!("[{}] ⚠️ 加密探测失败: {}", name, probe),
                }
                Err(e.into())
            }
        }
    }

    // ========== 提交 ==========

    /// 执行一次提交
    ///
    /// 成功时清空集合；423 时把加密文件并入集合；其他失败时集合保持不变。
    /// 未就绪或已有提交进行中时直接返回错误，不发请求。
    pub async fn submit(&self, transform: &Transform) -> Result<SubmitOutcome, CollectionError> {
        let request = {
            let collection = self.collection.lock().await;
            self.ensure_idle()?;
            let request = submission::prepare(&collection, transform)?;
            self.submitting.store(true, Ordering::SeqCst);
            request
        };
        let guard = SubmittingGuard(&self.submitting);

        let outcome = self.submission.execute(&request).await;

        let mut collection = self.collection.lock().await;
        let outcome = match outcome {
            SubmitOutcome::Succeeded(output) => {
                collection.reset();
                SubmitOutcome::Succeeded(output)
            }
            SubmitOutcome::Recoverable { locked, .. } => submission::apply_locked(&mut collection, locked),
            failed @ SubmitOutcome::Failed { .. } => failed,
        };
        drop(guard);
        Ok(outcome)
    }
}
