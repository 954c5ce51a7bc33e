// ==========================================
// 表格数据导入系统 - 记录存储 Repository Trait
// ==========================================
// 职责: 定义导入落库与规则查询所需的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::{ModelDescriptor, Record};
use crate::repository::error::RepositoryResult;
use crate::repository::query::RecordQuery;
use async_trait::async_trait;

// ==========================================
// RecordStorage Trait
// ==========================================
// 实现者: SqliteRecordStorage（使用 rusqlite）
#[async_trait]
pub trait RecordStorage: Send + Sync {
    /// 创建一条记录
    ///
    /// # 参数
    /// - model: 目标模型（表）
    /// - values: 属性 → 值（空值写为 NULL）
    ///
    /// # 返回
    /// - Ok(i64): 新记录 rowid
    /// - Err: 约束违反 / 持久化失败
    async fn create(&self, model: &ModelDescriptor, values: &Record) -> RepositoryResult<i64>;

    /// 统计满足查询条件的记录数（供 unique / exists 规则使用）
    async fn count(&self, query: &RecordQuery) -> RepositoryResult<u64>;
}
