//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层持有集合状态并调度各项能力，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `pdf_manager` - 文档集合管理器
//! - 唯一持有 `CollectionState`
//! - 加入文件后触发批量校验
//! - 处理解锁和预览失败后的加密探测
//! - 控制提交状态（同一时间最多一次提交）
//!
//! ### `app` - 命令行驱动
//! - 加载会话清单或扫描输入目录
//! - 用清单密码解锁、提交、423 后重试
//! - 写出结果文件
//!
//! ## 层次关系
//!
//! ```text
//! app (一次会话)
//!     ↓
//! pdf_manager (集合状态 + 提交状态)
//!     ↓
//! workflow::SubmissionWorkflow (一次提交)
//!     ↓
//! services (能力层：校验 / 加密探测 / 预览)
//!     ↓
//! clients (PdfApi)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一所有者**：只有 pdf_manager 修改集合
//! 2. **不持锁做 I/O**：先取快照，请求完成后凭票据回写
//! 3. **向下依赖**：编排层 → workflow → services → clients

pub mod app;
pub mod pdf_manager;

// 重新导出主要类型
pub use app::App;
pub use pdf_manager::{AddReport, PdfManager, PreviewDiagnosis, SubmissionPhase};
