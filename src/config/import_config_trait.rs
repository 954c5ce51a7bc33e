// ==========================================
// 表格数据导入系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;
use std::path::PathBuf;

/// 预览样本默认行数
pub const DEFAULT_SAMPLE_SIZE: usize = 10;

/// 配置读取结果
pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）/ ImportConfig（内存值）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取预览样本行数
    ///
    /// # 默认值
    /// - 10
    ///
    /// # 约束
    /// - 非法值（0 / 非数字）回退默认值
    async fn get_preview_sample_size(&self) -> ConfigResult<usize>;

    /// 获取上传文件所在目录
    ///
    /// # 用途
    /// - API 层把上传文件名解析为路径；核心引擎只接收路径
    async fn get_upload_dir(&self) -> ConfigResult<PathBuf>;
}

// ==========================================
// ImportConfig - 内存配置
// ==========================================
// 用途: 命令行 / 测试场景，不依赖 config_kv 表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportConfig {
    pub sample_size: usize,
    pub upload_dir: PathBuf,
}

impl ImportConfig {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            upload_dir: upload_dir.into(),
        }
    }

    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = if sample_size == 0 {
            DEFAULT_SAMPLE_SIZE
        } else {
            sample_size
        };
        self
    }
}

#[async_trait]
impl ImportConfigReader for ImportConfig {
    async fn get_preview_sample_size(&self) -> ConfigResult<usize> {
        Ok(self.sample_size)
    }

    async fn get_upload_dir(&self) -> ConfigResult<PathBuf> {
        Ok(self.upload_dir.clone())
    }
}
