// ==========================================
// 表格数据导入系统 - 应用层
// ==========================================
// 职责: 依赖组装，连接命令行与业务 API
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, get_default_upload_dir, AppState};
