// ==========================================
// 表格数据导入系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::{ConfigResult, ImportConfigReader, DEFAULT_SAMPLE_SIZE};
use crate::db::{configure_sqlite_connection, ensure_config_table, open_sqlite_connection};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 配置键
pub mod config_keys {
    /// 预览样本行数
    pub const PREVIEW_SAMPLE_SIZE: &str = "import.preview_sample_size";
    /// 上传目录
    pub const UPLOAD_DIR: &str = "import.upload_dir";
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
    /// config_kv 未配置上传目录时使用的目录
    default_upload_dir: PathBuf,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - default_upload_dir: 缺省上传目录
    pub fn new(db_path: &str, default_upload_dir: impl Into<PathBuf>) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_config_table(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            default_upload_dir: default_upload_dir.into(),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(
        conn: Arc<Mutex<Connection>>,
        default_upload_dir: impl Into<PathBuf>,
    ) -> ConfigResult<Self> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            configure_sqlite_connection(&conn_guard)?;
            ensure_config_table(&conn_guard)?;
        }

        Ok(Self {
            conn,
            default_upload_dir: default_upload_dir.into(),
        })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        Ok(())
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_preview_sample_size(&self) -> ConfigResult<usize> {
        let value = self.get_config_value(config_keys::PREVIEW_SAMPLE_SIZE)?;

        let size = match value {
            None => DEFAULT_SAMPLE_SIZE,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    tracing::warn!(
                        config_key = config_keys::PREVIEW_SAMPLE_SIZE,
                        raw_value = %raw,
                        "预览样本行数配置非法，使用默认值"
                    );
                    DEFAULT_SAMPLE_SIZE
                }
            },
        };

        Ok(size)
    }

    async fn get_upload_dir(&self) -> ConfigResult<PathBuf> {
        let value = self.get_config_value(config_keys::UPLOAD_DIR)?;

        Ok(match value {
            Some(raw) if !raw.trim().is_empty() => PathBuf::from(raw.trim()),
            _ => self.default_upload_dir.clone(),
        })
    }
}
