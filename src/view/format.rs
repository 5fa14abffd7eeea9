//! 展示用的格式化函数

/// 文件名展示的默认长度上限
pub const FILENAME_TRUNCATE_LIMIT: usize = 20;

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// 截断过长的文件名，结果（含 "..."）不超过 `limit` 个字符
pub fn truncate_filename(name: &str, limit: usize) -> String {
    if name.chars().count() > limit {
        let keep = limit.saturating_sub(3);
        name.chars().take(keep).collect::<String>() + "..."
    } else {
        name.to_string()
    }
}

/// 文件大小，保留两位小数并去掉末尾的 0
///
/// ```
/// use pdf_merge_client::view::format_file_size;
/// assert_eq!(format_file_size(1536), "1.5 KB");
/// ```
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let formatted = format!("{:.2}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, SIZE_UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_filename() {
        assert_eq!(truncate_filename("short.pdf", 20), "short.pdf");
        assert_eq!(
            truncate_filename("a-very-long-report-name.pdf", 20),
            "a-very-long-repor..."
        );
        assert_eq!(truncate_filename("a-very-long-report-name.pdf", 20).chars().count(), 20);
        assert_eq!(truncate_filename("年度报告最终版本第二稿修订.pdf", 10), "年度报告最终版...");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024 + 123_456), "5.12 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }
}
