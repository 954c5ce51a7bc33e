// ==========================================
// 表格数据导入系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 这里只放"整次运行"级别的致命错误；
//       行级失败/异常记录在 ImportOutcome 中，不走错误通道
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.txt/.xlsx/.xlsm/.xls/.ods）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("文件无数据行，无法识别列标题: {0}")]
    EmptyFile(String),

    // ===== 资源相关错误 =====
    #[error("未知资源: {0}")]
    UnknownResource(String),

    #[error("资源不允许导入: {0}")]
    ResourceNotImportable(String),

    #[error("资源目录加载失败: {0}")]
    CatalogLoad(String),

    #[error("资源字段解析失败 (resource={resource}): {message}")]
    ResourceIntrospection { resource: String, message: String },

    #[error("校验规则解析失败 (resource={resource}, attribute={attribute}): {message}")]
    RuleResolution {
        resource: String,
        attribute: String,
        message: String,
    },

    // ===== 存储错误 =====
    #[error("存储访问失败: {0}")]
    Storage(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否属于"文件不可读"一类（缺失/格式/解析失败）
    pub fn is_file_error(&self) -> bool {
        matches!(
            self,
            ImportError::FileNotFound(_)
                | ImportError::UnsupportedFormat(_)
                | ImportError::FileReadError(_)
                | ImportError::ExcelParseError(_)
                | ImportError::CsvParseError(_)
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
