use crate::config::Config;
/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志
///
/// `RUST_LOG` 优先；否则默认 `info`，开启详细日志时为 `debug`。
/// 重复调用不会报错。
///
/// # 参数
/// - `verbose`: 是否显示详细日志
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 程序配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - PDF 合并客户端");
    info!("🌐 服务地址: {}", config.api_base_url);
    info!("📊 文件数量上限: {}", config.max_files);
    info!("{}", "=".repeat(60));
}

/// 记录文件加载信息
///
/// # 参数
/// - `total`: 文件总数
/// - `source`: 文件来源（清单路径或文件夹）
pub fn log_collection_loaded(total: usize, source: &str) {
    info!("✓ 从 {} 加载了 {} 个文件", source, total);
}

/// 打印最终统计信息
///
/// # 参数
/// - `tool`: 执行的工具
/// - `success`: 是否成功
/// - `attempts`: 提交次数
/// - `output`: 输出文件路径（成功时）
pub fn print_final_summary(tool: &str, success: bool, attempts: usize, output: Option<&str>) {
    info!("\n{}", "=".repeat(60));
    info!("📊 处理完成");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("🛠️ 工具: {}", tool);
    info!("🔁 提交次数: {}", attempts);
    if success {
        info!("✅ 成功");
    } else {
        info!("❌ 未完成");
    }
    info!("{}", "=".repeat(60));
    if let Some(output) = output {
        info!("\n结果已保存至: {}", output);
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
