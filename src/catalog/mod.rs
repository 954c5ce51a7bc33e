// ==========================================
// 表格数据导入系统 - 资源目录层
// ==========================================
// 职责: 以能力句柄的形式登记可导入资源
// 约束: 资源在目录构建时解析一次，导入时不按名称动态构造
// ==========================================

pub mod declared;
pub mod registry;
pub mod resource;

// 重导出核心类型
pub use declared::{CatalogFile, DeclaredField, DeclaredResource};
pub use registry::ResourceCatalog;
pub use resource::{Resource, RuleDeclarations};
