// ==========================================
// 表格数据导入系统 - 导入引擎
// ==========================================
// 职责: 逐行 映射 → 校验 → 落库，并累积行级失败/异常
// 流程: 读取文件 → (逐行) 列投影 → 规则校验 → 写入存储 → 汇总
// ==========================================
// 约束:
// - 行严格按原始顺序串行处理，行号从 0 开始
// - 单行失败/异常只记录，不中断整次运行
// - 只有"整次运行无意义"的情况（文件不可读等）才返回 Err，且发生在处理任何行之前
// - 每行的校验规则都从工厂新建实例
// ==========================================

use crate::domain::{ColumnMapping, ImportOutcome, ModelDescriptor, RowError, RowFailure};
use crate::importer::column_mapper::ColumnMapper;
use crate::importer::error::ImportResult;
use crate::importer::rule_compiler::CompiledRuleSet;
use crate::importer::traits::TabularReader;
use crate::importer::validator::RowValidator;
use crate::repository::RecordStorage;
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ImportJob - 一次导入所需的全部参数
// ==========================================
#[derive(Debug, Clone)]
pub struct ImportJob {
    /// 资源键（日志 / 结果标识）
    pub resource: String,
    /// 可写属性白名单
    pub attributes: Vec<String>,
    /// 列映射
    pub mapping: ColumnMapping,
    /// 编译后的规则（空 = 不校验）
    pub rules: CompiledRuleSet,
    /// 落库目标
    pub model: ModelDescriptor,
}

impl ImportJob {
    pub fn new(resource: impl Into<String>, model: ModelDescriptor) -> Self {
        Self {
            resource: resource.into(),
            attributes: Vec::new(),
            mapping: ColumnMapping::new(),
            rules: CompiledRuleSet::empty(),
            model,
        }
    }

    pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mapping(mut self, mapping: ColumnMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_rules(mut self, rules: CompiledRuleSet) -> Self {
        self.rules = rules;
        self
    }
}

// ==========================================
// ImportEngine
// ==========================================
pub struct ImportEngine {
    reader: Arc<dyn TabularReader>,
    storage: Arc<dyn RecordStorage>,
}

impl ImportEngine {
    /// 创建导入引擎
    ///
    /// # 参数
    /// - reader: 表格读取器
    /// - storage: 记录存储（落库 + 规则查询）
    pub fn new(reader: Arc<dyn TabularReader>, storage: Arc<dyn RecordStorage>) -> Self {
        Self { reader, storage }
    }

    /// 执行导入
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 每行的失败 / 异常明细
    /// - Err: 文件不可读（此时没有任何行被处理）
    #[instrument(skip(self, job, file_path), fields(resource = %job.resource, run_id = tracing::field::Empty))]
    pub async fn import(&self, job: &ImportJob, file_path: &Path) -> ImportResult<ImportOutcome> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());

        info!(file_path = %file_path.display(), validate = !job.rules.is_empty(), "开始导入");

        // === 步骤 1: 读取文件 ===
        let rows = self.reader.read(file_path).map_err(|e| {
            error!(error = %e, "文件读取失败");
            e
        })?;
        let total_rows = rows.len();
        debug!(total_rows, "文件读取完成");

        // === 步骤 2: 逐行处理 ===
        let mapper = ColumnMapper::new(&job.mapping, &job.attributes);
        let validator = RowValidator::new(&job.rules, self.storage.as_ref());
        let validate = !job.rules.is_empty();

        let mut failures = Vec::new();
        let mut errors = Vec::new();

        for (row_idx, row) in rows.iter().enumerate() {
            let record = mapper.project(row);

            // 2.1 校验（未启用时跳过）
            if validate {
                match validator.validate(&record).await {
                    Ok(field_errors) if !field_errors.is_empty() => {
                        debug!(row = row_idx, attributes = field_errors.len(), "行校验未通过");
                        failures.push(RowFailure {
                            row: row_idx,
                            errors: field_errors,
                            values: record,
                        });
                        continue;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(row = row_idx, error = %e, "行校验时查询失败");
                        errors.push(RowError {
                            row: row_idx,
                            message: e.to_string(),
                        });
                        continue;
                    }
                }
            }

            // 2.2 落库
            if let Err(e) = self.storage.create(&job.model, &record).await {
                warn!(row = row_idx, error = %e, "行写入失败");
                errors.push(RowError {
                    row: row_idx,
                    message: e.to_string(),
                });
            }
        }

        // === 步骤 3: 汇总 ===
        let outcome = ImportOutcome {
            run_id,
            resource: job.resource.clone(),
            total_rows,
            failures,
            errors,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            total = outcome.total_rows,
            imported = outcome.imported(),
            failures = outcome.failures.len(),
            errors = outcome.errors.len(),
            elapsed_ms = outcome.elapsed_ms(),
            "导入完成"
        );

        Ok(outcome)
    }
}
