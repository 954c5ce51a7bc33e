// ==========================================
// 表格数据导入API
// ==========================================
// 职责: 对外暴露 preview / import 两个入口
// - 上传文件名 → 路径解析（UploadLocator）
// - 资源查找、规则编译、组装 ImportJob
// - 导入结果汇总为 ImportReport
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::catalog::ResourceCatalog;
use crate::config::ImportConfigReader;
use crate::domain::{ColumnMapping, ImportReport, PreviewResult, RequestContext};
use crate::importer::{
    CompiledRuleSet, ImportEngine, ImportJob, PreviewEngine, ResultReporter, RuleCompiler,
    TabularReader,
};
use crate::repository::RecordStorage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 导入请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportRequest {
    /// 目标资源键
    pub resource: String,
    /// 源列 → 目标属性
    #[serde(default)]
    pub mappings: ColumnMapping,
    /// 是否启用校验（仅 JSON true 视为启用）
    #[serde(default)]
    pub use_validation: Value,
}

impl ImportRequest {
    pub fn new(resource: impl Into<String>, mappings: ColumnMapping) -> Self {
        Self {
            resource: resource.into(),
            mappings,
            use_validation: Value::Null,
        }
    }

    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.use_validation = Value::Bool(enabled);
        self
    }

    /// 校验开关：只有布尔 true 才开启
    pub fn validation_enabled(&self) -> bool {
        match &self.use_validation {
            Value::Bool(flag) => *flag,
            Value::Null => false,
            other => {
                debug!(use_validation = %other, "use_validation 非布尔值，按关闭处理");
                false
            }
        }
    }
}

// ==========================================
// UploadLocator - 上传文件名 → 路径
// ==========================================
#[derive(Debug, Clone)]
pub struct UploadLocator {
    upload_dir: PathBuf,
}

impl UploadLocator {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    /// 解析上传文件名
    ///
    /// # 错误
    /// - InvalidInput: 空名，或不是单个普通路径分量（含分隔符 / "." / ".."）
    pub fn resolve(&self, file: &str) -> ApiResult<PathBuf> {
        let name = file.trim();

        if name.is_empty() {
            return Err(ApiError::InvalidInput("文件名不能为空".to_string()));
        }

        // '\\' 在非 Windows 平台不是分隔符，单独拒绝
        let mut components = Path::new(name).components();
        let single_normal = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_normal || name.contains('\\') {
            return Err(ApiError::InvalidInput(format!("非法文件名: {}", name)));
        }

        Ok(self.upload_dir.join(name))
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }
}

/// 导入API
pub struct ImportApi {
    catalog: Arc<ResourceCatalog>,
    reader: Arc<dyn TabularReader>,
    storage: Arc<dyn RecordStorage>,
    config: Arc<dyn ImportConfigReader>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(
        catalog: Arc<ResourceCatalog>,
        reader: Arc<dyn TabularReader>,
        storage: Arc<dyn RecordStorage>,
        config: Arc<dyn ImportConfigReader>,
    ) -> Self {
        Self {
            catalog,
            reader,
            storage,
            config,
        }
    }

    async fn locator(&self) -> ApiResult<UploadLocator> {
        let dir = self
            .config
            .get_upload_dir()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        Ok(UploadLocator::new(dir))
    }

    /// 预览上传文件
    ///
    /// # 参数
    /// - file: 上传文件名（相对上传目录）
    ///
    /// # 返回
    /// - Ok(PreviewResult): 列标题、总行数、样本、可导入资源及其字段
    /// - Err(ApiError): 文件不可读 / 无数据行 / 资源字段求值失败
    pub async fn preview(&self, file: &str) -> ApiResult<PreviewResult> {
        let path = self.locator().await?.resolve(file)?;
        let sample_size = self
            .config
            .get_preview_sample_size()
            .await
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let engine = PreviewEngine::new(
            Arc::clone(&self.reader),
            Arc::clone(&self.catalog),
            sample_size,
        );
        Ok(engine.preview(&path, &RequestContext::default())?)
    }

    /// 导入上传文件
    ///
    /// # 参数
    /// - file: 上传文件名（相对上传目录）
    /// - request: 资源键、列映射、校验开关
    ///
    /// # 返回
    /// - Ok(ImportReport): success，或 failure + 行级明细
    /// - Err(ApiError): 资源未知 / 规则无法解析 / 文件不可读（均未处理任何行）
    pub async fn import(&self, file: &str, request: &ImportRequest) -> ApiResult<ImportReport> {
        let path = self.locator().await?.resolve(file)?;

        let resource = self.catalog.resource_for_key(&request.resource)?;
        let ctx = RequestContext::for_resource(resource.uri_key());

        let attributes: Vec<String> = resource
            .creation_fields(&ctx)?
            .into_iter()
            .map(|f| f.attribute)
            .collect();

        let rules = if request.validation_enabled() {
            RuleCompiler::compile(resource.as_ref(), &ctx)?
        } else {
            CompiledRuleSet::empty()
        };

        let job = ImportJob::new(resource.uri_key(), resource.model())
            .with_attributes(attributes)
            .with_mapping(request.mappings.clone())
            .with_rules(rules);

        let engine = ImportEngine::new(Arc::clone(&self.reader), Arc::clone(&self.storage));
        let outcome = engine.import(&job, &path).await?;

        let report = ResultReporter::report(outcome);
        info!(
            resource = %request.resource,
            success = report.is_success(),
            imported = report.imported,
            "导入请求处理完成"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_enabled_only_for_true() {
        let mut request = ImportRequest::new("users", ColumnMapping::new());
        assert!(!request.validation_enabled());

        for value in [json!(false), json!("true"), json!(1), json!({"on": true})] {
            request.use_validation = value;
            assert!(!request.validation_enabled());
        }

        request.use_validation = json!(true);
        assert!(request.validation_enabled());
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: ImportRequest = serde_json::from_str(
            r#"{"resource":"users","mappings":{"Name":"name"},"use_validation":"yes"}"#,
        )
        .unwrap();

        assert_eq!(request.mappings.attribute_for("Name"), Some("name"));
        assert!(!request.validation_enabled());

        let bare: ImportRequest = serde_json::from_str(r#"{"resource":"users"}"#).unwrap();
        assert!(bare.mappings.is_empty());
        assert!(!bare.validation_enabled());
    }

    #[test]
    fn test_upload_locator_rejects_traversal() {
        let locator = UploadLocator::new("/srv/uploads");

        assert_eq!(
            locator.resolve("users.csv").unwrap(),
            PathBuf::from("/srv/uploads/users.csv")
        );
        for bad in ["", "  ", "..", ".", "../etc/passwd", "a/b.csv", "a\\b.csv", "/etc/passwd"] {
            assert!(
                matches!(locator.resolve(bad), Err(ApiError::InvalidInput(_))),
                "expected rejection for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_upload_locator_accepts_dotted_names() {
        let locator = UploadLocator::new("/srv/uploads");

        for name in ["report..v2.csv", "..csv", ".hidden.csv"] {
            assert_eq!(
                locator.resolve(name).unwrap(),
                PathBuf::from("/srv/uploads").join(name)
            );
        }
    }
}
