// ==========================================
// 表格数据导入系统 - 记录查询游标
// ==========================================
// RecordQuery 会随着规则执行不断追加过滤条件（可变状态）。
// 关系类规则（unique / exists）持有它，因此同一个实例不能跨行复用，
// 每行校验前必须通过 new_query() 得到无过滤条件的新游标。
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};

/// 单个等值过滤条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    pub column: String,
    pub value: String,
}

/// 针对单表的计数查询
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    table: String,
    filters: Vec<QueryFilter>,
}

impl RecordQuery {
    /// 创建指向某张表、无过滤条件的查询
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
        }
    }

    /// 基于当前表生成一个全新的、无过滤条件的查询
    pub fn new_query(&self) -> Self {
        Self::table(self.table.clone())
    }

    pub fn where_eq(&mut self, column: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.filters.push(QueryFilter {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn filters(&self) -> &[QueryFilter] {
        &self.filters
    }

    /// 生成 COUNT 语句与绑定参数
    pub fn to_count_sql(&self) -> RepositoryResult<(String, Vec<String>)> {
        let mut sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(&self.table)?);
        let mut params = Vec::with_capacity(self.filters.len());

        for (idx, filter) in self.filters.iter().enumerate() {
            sql.push_str(if idx == 0 { " WHERE " } else { " AND " });
            sql.push_str(&format!(
                "{} = ?{}",
                quote_identifier(&filter.column)?,
                idx + 1
            ));
            params.push(filter.value.clone());
        }

        Ok((sql, params))
    }
}

/// 校验并加引号的 SQL 标识符（仅允许 [A-Za-z_][A-Za-z0-9_]*）
pub fn quote_identifier(name: &str) -> RepositoryResult<String> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if !valid {
        return Err(RepositoryError::InvalidIdentifier(name.to_string()));
    }

    Ok(format!("\"{}\"", name))
}
