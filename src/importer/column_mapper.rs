// ==========================================
// 表格数据导入系统 - 列映射器
// ==========================================
// 职责: 源列 → 资源属性投影
// 规则:
// - 只保留映射目标在属性白名单内的列，其余静默丢弃
// - 未映射的属性不出现在结果中（不补默认值）
// - 映射目标为空串视为"不导入该列"
// - 映射的列在行中不存在时跳过
// ==========================================

use crate::domain::{ColumnMapping, Record, Row};
use std::collections::HashSet;
use tracing::debug;

pub struct ColumnMapper<'a> {
    mapping: &'a ColumnMapping,
    attributes: HashSet<&'a str>,
}

impl<'a> ColumnMapper<'a> {
    /// # 参数
    /// - mapping: 用户提交的列映射
    /// - attributes: 资源允许写入的属性
    pub fn new(mapping: &'a ColumnMapping, attributes: &'a [String]) -> Self {
        let attributes = attributes.iter().map(String::as_str).collect();
        let mapper = Self {
            mapping,
            attributes,
        };

        let dropped = mapper.rejected_targets();
        if !dropped.is_empty() {
            debug!(?dropped, "映射目标不在可写属性中，已忽略");
        }

        mapper
    }

    /// 不在白名单内的映射目标（列, 属性）
    pub fn rejected_targets(&self) -> Vec<(&'a str, &'a str)> {
        self.mapping
            .iter()
            .filter(|(_, attribute)| !attribute.is_empty() && !self.attributes.contains(attribute))
            .collect()
    }

    /// 把一行投影为待写入记录
    pub fn project(&self, row: &Row) -> Record {
        let mut record = Record::new();

        for (column, attribute) in self.mapping.iter() {
            if attribute.is_empty() || !self.attributes.contains(attribute) {
                continue;
            }
            if let Some(value) = row.get(column) {
                record.insert(attribute.to_string(), value.clone());
            }
        }

        record
    }
}
