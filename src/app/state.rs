// ==========================================
// 表格数据导入系统 - 应用状态
// ==========================================
// 职责: 组装读取器 / 存储 / 资源目录 / 配置，并持有 API 实例
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::ImportApi;
use crate::catalog::ResourceCatalog;
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::open_sqlite_connection;
use crate::importer::{TabularReader, UniversalFileParser};
use crate::repository::{RecordStorage, SqliteRecordStorage};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "TABULAR_IMPORT_DB_PATH";
/// 上传目录环境变量
pub const UPLOAD_DIR_ENV: &str = "TABULAR_IMPORT_UPLOAD_DIR";

/// 应用状态
///
/// 所有组件共享同一个数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 资源目录
    pub catalog: Arc<ResourceCatalog>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 表格读取器
    pub reader: Arc<dyn TabularReader>,

    /// 记录存储
    pub storage: Arc<dyn RecordStorage>,

    /// 导入API
    pub import_api: Arc<ImportApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - catalog: 已加载的资源目录
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    pub fn new(db_path: String, catalog: ResourceCatalog) -> Result<Self, String> {
        Self::with_upload_dir(db_path, catalog, get_default_upload_dir())
    }

    /// 指定缺省上传目录创建（config_kv 中的配置仍然优先）
    pub fn with_upload_dir(
        db_path: String,
        catalog: ResourceCatalog,
        upload_dir: PathBuf,
    ) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, resources = catalog.list().len(), "初始化AppState");

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone(), upload_dir)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let storage: Arc<dyn RecordStorage> = Arc::new(
            SqliteRecordStorage::from_connection(conn)
                .map_err(|e| format!("无法创建SqliteRecordStorage: {}", e))?,
        );
        let reader: Arc<dyn TabularReader> = Arc::new(UniversalFileParser);
        let catalog = Arc::new(catalog);

        let config: Arc<dyn ImportConfigReader> = config_manager.clone();
        let import_api = Arc::new(ImportApi::new(
            Arc::clone(&catalog),
            Arc::clone(&reader),
            Arc::clone(&storage),
            config,
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            catalog,
            config_manager,
            reader,
            storage,
            import_api,
        })
    }

    /// 用另一份配置（例如命令行指定的上传目录）构造 ImportApi，其余组件共享
    pub fn import_api_with_config(&self, config: Arc<dyn ImportConfigReader>) -> ImportApi {
        ImportApi::new(
            Arc::clone(&self.catalog),
            Arc::clone(&self.reader),
            Arc::clone(&self.storage),
            config,
        )
    }
}

fn env_path(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn app_data_dir() -> Option<PathBuf> {
    let data_dir = dirs::data_dir()?;
    let dir = data_dir.join("tabular-import");
    std::fs::create_dir_all(&dir).ok();
    Some(dir)
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Some(path) = env_path(DB_PATH_ENV) {
        return path;
    }

    app_data_dir()
        .map(|dir| dir.join("tabular_import.db"))
        .unwrap_or_else(|| PathBuf::from("./tabular_import.db"))
        .to_string_lossy()
        .to_string()
}

/// 获取默认上传目录
///
/// 优先级: 环境变量 > 用户数据目录/uploads > ./uploads
pub fn get_default_upload_dir() -> PathBuf {
    if let Some(path) = env_path(UPLOAD_DIR_ENV) {
        return PathBuf::from(path);
    }

    app_data_dir()
        .map(|dir| dir.join("uploads"))
        .unwrap_or_else(|| PathBuf::from("./uploads"))
}
