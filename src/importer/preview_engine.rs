// ==========================================
// 表格数据导入系统 - 预览引擎
// ==========================================
// 职责: 一次返回映射界面所需的全部数据
// - 列标题 / 总行数 / 前 N 行样本
// - 可导入资源（键 → 名称）及其可写字段
// 约束: 只读文件，不产生其他副作用，可对同一文件重复调用
// ==========================================

use crate::catalog::ResourceCatalog;
use crate::domain::{PreviewResult, RequestContext};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::traits::TabularReader;
use indexmap::IndexMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

pub struct PreviewEngine {
    reader: Arc<dyn TabularReader>,
    catalog: Arc<ResourceCatalog>,
    sample_size: usize,
}

impl PreviewEngine {
    pub fn new(
        reader: Arc<dyn TabularReader>,
        catalog: Arc<ResourceCatalog>,
        sample_size: usize,
    ) -> Self {
        Self {
            reader,
            catalog,
            sample_size,
        }
    }

    /// 生成预览
    ///
    /// # 错误
    /// - 文件类错误: 文件缺失 / 不可读 / 不可解析
    /// - EmptyFile: 文件无数据行
    /// - ResourceIntrospection: 资源字段无法求值
    #[instrument(skip(self, file_path, ctx), fields(file_path = %file_path.display()))]
    pub fn preview(&self, file_path: &Path, ctx: &RequestContext) -> ImportResult<PreviewResult> {
        let rows = self.reader.read(file_path)?;

        let headings: Vec<String> = rows
            .first()
            .ok_or_else(|| ImportError::EmptyFile(file_path.display().to_string()))?
            .keys()
            .cloned()
            .collect();

        let total_rows = rows.len();
        let sample = rows.into_iter().take(self.sample_size).collect::<Vec<_>>();

        let mut resources = IndexMap::new();
        let mut fields = IndexMap::new();
        for resource in self.catalog.importable() {
            let creation_fields = resource.creation_fields(ctx)?;
            resources.insert(resource.uri_key().to_string(), resource.label().to_string());
            fields.insert(resource.uri_key().to_string(), creation_fields);
        }

        debug!(
            headings = headings.len(),
            total_rows,
            sample = sample.len(),
            resources = resources.len(),
            "预览生成完成"
        );

        Ok(PreviewResult {
            headings,
            total_rows,
            sample,
            resources,
            fields,
        })
    }
}
