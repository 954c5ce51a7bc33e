// ==========================================
// 表格数据导入系统 - 领域模型层
// ==========================================
// 职责: 定义导入管道使用的实体与值对象
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod outcome;
pub mod preview;
pub mod resource;
pub mod row;

// 重导出核心类型
pub use outcome::{ImportOutcome, ImportReport, ImportStatus, RowError, RowFailure};
pub use preview::PreviewResult;
pub use resource::{ColumnMapping, CreationField, ModelDescriptor, RequestContext};
pub use row::{Record, Row};
