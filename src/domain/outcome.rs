// ==========================================
// 表格数据导入系统 - 导入结果模型
// ==========================================
// ImportOutcome: 导入引擎逐行累积的结果
// ImportReport: 汇总后返回给调用方的结论
// ==========================================

use crate::domain::row::Record;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ==========================================
// RowFailure - 行级校验失败（未写入）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    /// 行号（从 0 开始，不含表头）
    pub row: usize,
    /// 属性 → 失败消息
    pub errors: IndexMap<String, Vec<String>>,
    /// 投影后的记录值（便于前端定位）
    pub values: Record,
}

impl RowFailure {
    /// 扁平化的全部消息
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.errors.values().flatten().map(String::as_str)
    }
}

// ==========================================
// RowError - 行级写入异常
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    /// 行号（从 0 开始，不含表头）
    pub row: usize,
    /// 异常描述
    pub message: String,
}

// ==========================================
// ImportOutcome - 一次导入运行的累积结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    /// 运行 ID
    pub run_id: String,
    /// 资源键
    pub resource: String,
    /// 文件总行数
    pub total_rows: usize,
    /// 校验失败行
    pub failures: Vec<RowFailure>,
    /// 写入异常行
    pub errors: Vec<RowError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ImportOutcome {
    /// 成功写入的行数（总数 - 失败 - 异常）
    pub fn imported(&self) -> usize {
        self.total_rows
            .saturating_sub(self.failures.len())
            .saturating_sub(self.errors.len())
    }

    pub fn has_problems(&self) -> bool {
        !self.failures.is_empty() || !self.errors.is_empty()
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

// ==========================================
// ImportReport - 返回给调用方的结论
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Success,
    Failure,
}

/// 序列化形态:
/// - 成功: {"result":"success"}
/// - 失败: {"result":"failure","errors":[...],"failures":[...]}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub result: ImportStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<RowError>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failures: Option<Vec<RowFailure>>,
    /// 成功写入行数（仅供 CLI 摘要）
    #[serde(skip)]
    pub imported: usize,
    /// 总行数（仅供 CLI 摘要）
    #[serde(skip)]
    pub total_rows: usize,
}

impl ImportReport {
    pub fn is_success(&self) -> bool {
        self.result == ImportStatus::Success
    }
}
