// ==========================================
// 表格数据导入系统 - 配置层
// ==========================================
// 职责: 导入相关配置的读取与覆写
// 存储: config_kv 表 (key-value + scope)，缺省时回退默认值
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::{ConfigResult, ImportConfig, ImportConfigReader, DEFAULT_SAMPLE_SIZE};
