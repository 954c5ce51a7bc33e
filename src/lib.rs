// ==========================================
// 表格数据导入系统 - 核心库
// ==========================================
// 功能: 表格文件预览 → 列映射 → 逐行校验 → 部分失败容忍的批量导入
// 技术栈: Rust + SQLite + calamine/csv
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 值对象与结果模型
pub mod domain;

// 资源目录 - 可导入资源的能力声明
pub mod catalog;

// 导入层 - 预览 / 规则编译 / 导入 / 汇总
pub mod importer;

// 数据仓储层 - 记录写入与规则查询
pub mod repository;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 对外接口
pub mod api;

// 应用层 - 依赖组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    ColumnMapping, CreationField, ImportOutcome, ImportReport, ImportStatus, ModelDescriptor,
    PreviewResult, Record, RequestContext, Row, RowError, RowFailure,
};

// 资源目录
pub use catalog::{DeclaredResource, Resource, ResourceCatalog};

// 导入引擎
pub use importer::{
    ImportEngine, ImportError, ImportJob, PreviewEngine, ResultReporter, RuleCompiler,
    TabularReader, UniversalFileParser,
};

// 存储
pub use repository::{RecordStorage, SqliteRecordStorage};

// API
pub use api::{ApiError, ImportApi, ImportRequest};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "表格数据导入系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
