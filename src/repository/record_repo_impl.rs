// ==========================================
// 表格数据导入系统 - 记录存储 Repository 实现
// ==========================================
// 职责: 基于 rusqlite 实现 RecordStorage
// 约束: 标识符白名单校验 + 参数化取值，防止 SQL 注入
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::{ModelDescriptor, Record};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::query::{quote_identifier, RecordQuery};
use crate::repository::record_repo::RecordStorage;
use async_trait::async_trait;
use rusqlite::{params_from_iter, Connection};
use std::sync::{Arc, Mutex};
use tracing::debug;

// ==========================================
// SqliteRecordStorage
// ==========================================
pub struct SqliteRecordStorage {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStorage {
    /// 创建新的存储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（会再次应用统一 PRAGMA，幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    fn build_insert_sql(model: &ModelDescriptor, values: &Record) -> RepositoryResult<String> {
        let table = quote_identifier(&model.table)?;

        if values.is_empty() {
            return Ok(format!("INSERT INTO {} DEFAULT VALUES", table));
        }

        let columns = values
            .keys()
            .map(|c| quote_identifier(c))
            .collect::<RepositoryResult<Vec<_>>>()?;
        let placeholders = (1..=columns.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>();

        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders.join(", ")
        ))
    }
}

#[async_trait]
impl RecordStorage for SqliteRecordStorage {
    async fn create(&self, model: &ModelDescriptor, values: &Record) -> RepositoryResult<i64> {
        let sql = Self::build_insert_sql(model, values)?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        // 空单元格写为 NULL，交由表约束判定
        let bound = values.values().map(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        });
        conn.execute(&sql, params_from_iter(bound))?;

        let id = conn.last_insert_rowid();
        debug!(table = %model.table, id, "记录已写入");
        Ok(id)
    }

    async fn count(&self, query: &RecordQuery) -> RepositoryResult<u64> {
        let (sql, params) = query.to_count_sql()?;

        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let count: i64 = conn.query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}
