//! # PDF Merge Client
//!
//! PDF 文档合并（及其他转换工具）的客户端编排
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 与远程 PDF 服务之间唯一的接缝
//! - `PdfApi` - 校验、密码检查、转换、健康检查
//! - `PdfApiClient` - 基于 reqwest 的 multipart 实现
//!
//! ### ② 状态层（Store）
//! - `store/` - `CollectionState`，有序文件列表 + 每个文件的条目
//! - 全部是纯状态变换，异步结果凭票据回写
//!
//! ### ③ 业务能力层（Services）
//! - `ValidationService` - 批量完整性校验
//! - `LockDiscovery` - 加密探测（是否加密以它为准）
//! - `PreviewRenderer` - 外部缩略图渲染接口
//!
//! ### ④ 流程层（Workflow）
//! - `SubmissionWorkflow` - 一次提交：就绪检查 → 构造请求 → 结果归类
//! - `Transform` - 合并 / 拆分 / 压缩 / 删页 / 加密 / 解密
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/pdf_manager` - 集合的唯一持有者
//! - `orchestrator/app` - 命令行驱动
//!
//! ### ⑥ 展示层（View）
//! - `view/` - 文件行、颜色、提示信息和格式化
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod store;
pub mod utils;
pub mod view;
pub mod workflow;

// 重新导出常用类型
pub use clients::{PdfApi, PdfApiClient};
pub use config::Config;
pub use error::{ApiError, AppError, AppResult, CollectionError};
pub use models::{DocumentHandle, Rotation};
pub use orchestrator::{App, PdfManager};
pub use store::CollectionState;
pub use workflow::{SubmitOutcome, Transform};
