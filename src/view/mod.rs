//! 展示适配层
//!
//! 把集合状态转换成可以直接显示的文件行和提示信息。

pub mod format;
pub mod rows;

pub use format::{format_file_size, truncate_filename, FILENAME_TRUNCATE_LIMIT};
pub use rows::{banner, render_rows, FileRow, RowColor, RowStatus, StatusBanner};
