// ==========================================
// 表格数据导入系统 - 预览结果
// ==========================================
// 只读响应对象，不落库
// ==========================================

use crate::domain::resource::CreationField;
use crate::domain::row::Row;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// 映射界面所需的全部数据（一次响应）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewResult {
    /// 列标题（首行键顺序）
    pub headings: Vec<String>,
    /// 总行数
    pub total_rows: usize,
    /// 前 N 行样本
    pub sample: Vec<Row>,
    /// 可导入资源（uri_key → label）
    pub resources: IndexMap<String, String>,
    /// 各资源可写字段（uri_key → 字段列表）
    pub fields: IndexMap<String, Vec<CreationField>>,
}
