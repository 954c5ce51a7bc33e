// ==========================================
// 表格数据导入系统 - 行校验器
// ==========================================
// 职责: 用编译后的规则集校验一条投影记录
// 约束: 每次 validate 都从工厂实例化新规则，不复用上一行的实例
// ==========================================

use crate::domain::Record;
use crate::importer::rule_compiler::CompiledRuleSet;
use crate::importer::rules::{RuleInput, RuleOutcome};
use crate::repository::{RecordStorage, RepositoryResult};
use indexmap::IndexMap;
use tracing::trace;

/// 属性 → 失败消息；为空表示校验通过
pub type ValidationErrors = IndexMap<String, Vec<String>>;

pub struct RowValidator<'a> {
    rules: &'a CompiledRuleSet,
    storage: &'a dyn RecordStorage,
}

impl<'a> RowValidator<'a> {
    pub fn new(rules: &'a CompiledRuleSet, storage: &'a dyn RecordStorage) -> Self {
        Self { rules, storage }
    }

    /// 校验一条记录
    ///
    /// # 返回
    /// - Ok(errors): errors 为空即通过；同一属性的全部失败规则都会报告
    /// - Err: 规则查询存储失败
    pub async fn validate(&self, record: &Record) -> RepositoryResult<ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.rules.is_empty() {
            return Ok(errors);
        }

        for attribute in self.rules.attributes() {
            let input = RuleInput {
                attribute,
                value: record.get(attribute).map(String::as_str),
                record,
            };

            for mut rule in self.rules.instantiate(attribute) {
                // 非隐式规则遇空值跳过
                if input.is_empty() && !rule.is_implicit() {
                    continue;
                }

                if let RuleOutcome::Fail(message) = rule.check(&input, self.storage).await? {
                    trace!(attribute, rule = rule.name(), %message, "规则未通过");
                    errors
                        .entry(attribute.to_string())
                        .or_default()
                        .push(message);
                }
            }
        }

        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RuleDeclarations;
    use crate::domain::ModelDescriptor;
    use crate::importer::rule_compiler::RuleCompiler;
    use crate::importer::rules::RuleDeclaration;
    use crate::repository::{RecordQuery, RepositoryError};
    use async_trait::async_trait;

    struct NoStorage;

    #[async_trait]
    impl RecordStorage for NoStorage {
        async fn create(&self, _model: &ModelDescriptor, _values: &Record) -> RepositoryResult<i64> {
            Ok(1)
        }

        async fn count(&self, _query: &RecordQuery) -> RepositoryResult<u64> {
            Err(RepositoryError::DatabaseQueryError("offline".to_string()))
        }
    }

    fn compile(pairs: &[(&str, &[&str])]) -> CompiledRuleSet {
        let decls: RuleDeclarations = pairs
            .iter()
            .map(|(a, rules)| {
                (
                    a.to_string(),
                    rules.iter().map(|r| RuleDeclaration::named(*r)).collect(),
                )
            })
            .collect();
        RuleCompiler::compile_declarations("users", &decls).unwrap()
    }

    fn record(pairs: &[(&str, &str)]) -> Record {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_empty_rule_set_always_passes() {
        let rules = CompiledRuleSet::empty();
        let validator = RowValidator::new(&rules, &NoStorage);

        let errors = validator.validate(&Record::new()).await.unwrap();
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_collects_all_failures_per_attribute() {
        let rules = compile(&[
            ("code", &["required", "max:2", "in:A,B"][..]),
            ("name", &["required"][..]),
        ]);
        let validator = RowValidator::new(&rules, &NoStorage);

        let errors = validator.validate(&record(&[("code", "XYZ")])).await.unwrap();

        assert_eq!(errors["code"].len(), 2);
        assert_eq!(errors["name"].len(), 1);
    }

    #[tokio::test]
    async fn test_non_implicit_rules_skip_empty_values() {
        // exists 会访问存储（此处必然报错），空值时不应被执行
        let rules = compile(&[("team_id", &["nullable", "exists:teams,id"][..])]);
        let validator = RowValidator::new(&rules, &NoStorage);

        let errors = validator.validate(&record(&[("team_id", "")])).await.unwrap();
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let rules = compile(&[("team_id", &["exists:teams,id"][..])]);
        let validator = RowValidator::new(&rules, &NoStorage);

        assert!(validator.validate(&record(&[("team_id", "1")])).await.is_err());
    }
}
