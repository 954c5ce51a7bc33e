// ==========================================
// 表格数据导入系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供记录写入与计数查询接口,屏蔽数据库细节
// 约束: 所有取值使用参数化,标识符走白名单校验
// ==========================================

pub mod error;
pub mod query;
pub mod record_repo;
pub mod record_repo_impl;

// 重导出核心类型
pub use error::{RepositoryError, RepositoryResult};
pub use query::{QueryFilter, RecordQuery};
pub use record_repo::RecordStorage;
pub use record_repo_impl::SqliteRecordStorage;
