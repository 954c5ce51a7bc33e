// ==========================================
// 表格数据导入系统 - 规则编译器
// ==========================================
// 职责: 把资源声明的创建校验规则编译为"规则工厂"集合
// 约束:
// - 编译结果只保存工厂，不保存可执行实例
// - 每次实例化都通过 Rule::fresh() 得到处于初始状态的新实例，
//   带查询游标的规则因此不会把上一行的过滤条件带到下一行
// - 未知规则 / 参数非法在编译期报错，导入尚未触碰任何行
// ==========================================

use crate::catalog::{Resource, RuleDeclarations};
use crate::domain::RequestContext;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::rules::{parse_named_rule, Rule, RuleDeclaration};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 规则工厂：每次调用产出一个新实例
pub type RuleFactory = Arc<dyn Fn() -> Box<dyn Rule> + Send + Sync>;

/// 编译后的单条规则
#[derive(Clone)]
pub struct CompiledRule {
    name: String,
    stateful: bool,
    factory: RuleFactory,
}

impl CompiledRule {
    fn from_template(template: Arc<dyn Rule>) -> Self {
        let name = template.name().to_string();
        let stateful = template.is_stateful();
        let factory: RuleFactory = Arc::new(move || template.fresh());
        Self {
            name,
            stateful,
            factory,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_stateful(&self) -> bool {
        self.stateful
    }

    /// 构造一个新的规则实例
    pub fn instantiate(&self) -> Box<dyn Rule> {
        (self.factory)()
    }
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledRule")
            .field("name", &self.name)
            .field("stateful", &self.stateful)
            .finish()
    }
}

// ==========================================
// CompiledRuleSet - 属性 → 规则工厂列表
// ==========================================
// 空集合表示"恒通过"（未启用校验）
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleSet {
    rules: IndexMap<String, Vec<CompiledRule>>,
}

impl CompiledRuleSet {
    /// 空规则集（不校验）
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.values().all(Vec::is_empty)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn rules_for(&self, attribute: &str) -> &[CompiledRule] {
        self.rules.get(attribute).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 为某属性实例化一组全新的规则
    pub fn instantiate(&self, attribute: &str) -> Vec<Box<dyn Rule>> {
        self.rules_for(attribute)
            .iter()
            .map(CompiledRule::instantiate)
            .collect()
    }

    pub fn stateful_count(&self) -> usize {
        self.rules
            .values()
            .flatten()
            .filter(|r| r.is_stateful())
            .count()
    }
}

// ==========================================
// RuleCompiler
// ==========================================
pub struct RuleCompiler;

impl RuleCompiler {
    /// 编译资源的创建校验规则
    ///
    /// # 错误
    /// - RuleResolution: 规则声明无法读取或无法解析
    pub fn compile(resource: &dyn Resource, ctx: &RequestContext) -> ImportResult<CompiledRuleSet> {
        let declarations = resource
            .creation_validation_rules(ctx)
            .map_err(|e| match e {
                err @ ImportError::RuleResolution { .. } => err,
                other => ImportError::RuleResolution {
                    resource: resource.uri_key().to_string(),
                    attribute: String::new(),
                    message: other.to_string(),
                },
            })?;

        Self::compile_declarations(resource.uri_key(), &declarations)
    }

    /// 编译规则声明
    pub fn compile_declarations(
        resource_key: &str,
        declarations: &RuleDeclarations,
    ) -> ImportResult<CompiledRuleSet> {
        let mut rules = IndexMap::new();

        for (attribute, decls) in declarations {
            // min/max 的语义取决于同属性是否声明为数值
            let numeric = decls.iter().any(|d| {
                matches!(d, RuleDeclaration::Named(token)
                    if matches!(token.trim(), "numeric" | "integer"))
            });

            let mut compiled = Vec::with_capacity(decls.len());
            for decl in decls {
                let template: Arc<dyn Rule> = match decl {
                    RuleDeclaration::Named(token) => {
                        let rule = parse_named_rule(token, attribute, numeric).map_err(|message| {
                            ImportError::RuleResolution {
                                resource: resource_key.to_string(),
                                attribute: attribute.clone(),
                                message,
                            }
                        })?;
                        Arc::from(rule)
                    }
                    RuleDeclaration::Custom(rule) => Arc::clone(rule),
                };
                compiled.push(CompiledRule::from_template(template));
            }

            rules.insert(attribute.clone(), compiled);
        }

        let set = CompiledRuleSet { rules };
        debug!(
            resource = %resource_key,
            attributes = set.rules.len(),
            stateful = set.stateful_count(),
            "校验规则编译完成"
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Record;
    use crate::importer::rules::{ExistsRule, RuleInput, RuleOutcome};
    use crate::repository::{RecordQuery, RecordStorage, RepositoryResult};
    use async_trait::async_trait;

    struct CountingStorage;

    #[async_trait]
    impl RecordStorage for CountingStorage {
        async fn create(
            &self,
            _model: &crate::domain::ModelDescriptor,
            _values: &Record,
        ) -> RepositoryResult<i64> {
            Ok(1)
        }

        async fn count(&self, query: &RecordQuery) -> RepositoryResult<u64> {
            // 只有单一过滤条件时才"找到"记录
            Ok(if query.filters().len() == 1 { 1 } else { 0 })
        }
    }

    fn declarations(pairs: &[(&str, Vec<RuleDeclaration>)]) -> RuleDeclarations {
        pairs
            .iter()
            .map(|(a, d)| (a.to_string(), d.clone()))
            .collect()
    }

    #[test]
    fn test_empty_declarations_compile_to_empty_set() {
        let set = RuleCompiler::compile_declarations("users", &RuleDeclarations::new()).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_unknown_rule_is_resolution_error() {
        let decls = declarations(&[("email", vec![RuleDeclaration::named("emailish")])]);

        let err = RuleCompiler::compile_declarations("users", &decls).unwrap_err();
        assert!(matches!(
            err,
            ImportError::RuleResolution { ref attribute, .. } if attribute == "email"
        ));
    }

    #[test]
    fn test_invalid_lookup_identifiers_fail_compilation() {
        let cases = [
            ("email", "unique:user-table,email"),
            ("team", "exists:teams,team code"),
            // 省略列名时使用属性名，属性名同样要是合法标识符
            ("e-mail", "unique:users"),
        ];

        for (attribute, token) in cases {
            let decls = declarations(&[(attribute, vec![RuleDeclaration::named(token)])]);

            let err = RuleCompiler::compile_declarations("users", &decls).unwrap_err();
            assert!(
                matches!(err, ImportError::RuleResolution { attribute: ref got, .. } if got == attribute),
                "expected RuleResolution for {}",
                token
            );
        }
    }

    #[test]
    fn test_stateful_rules_are_counted() {
        let decls = declarations(&[
            ("email", vec![RuleDeclaration::named("required"), RuleDeclaration::named("unique:users")]),
            ("team_id", vec![RuleDeclaration::named("exists:teams,id")]),
        ]);

        let set = RuleCompiler::compile_declarations("users", &decls).unwrap();
        assert_eq!(set.stateful_count(), 2);
        assert_eq!(set.rules_for("email").len(), 2);
        assert!(set.rules_for("missing").is_empty());
    }

    #[tokio::test]
    async fn test_custom_stateful_rule_is_reset_per_instantiation() {
        // 模板本身已经积累了过滤条件
        let mut template = ExistsRule::new("teams", "id");
        let record = Record::new();
        let input = RuleInput {
            attribute: "team_id",
            value: Some("1"),
            record: &record,
        };
        template.check(&input, &CountingStorage).await.unwrap();
        assert_eq!(template.query().filters().len(), 1);

        let decls = declarations(&[("team_id", vec![RuleDeclaration::custom(template)])]);
        let set = RuleCompiler::compile_declarations("users", &decls).unwrap();

        for value in ["2", "3"] {
            let input = RuleInput {
                attribute: "team_id",
                value: Some(value),
                record: &record,
            };
            let mut rules = set.instantiate("team_id");
            let outcome = rules[0].check(&input, &CountingStorage).await.unwrap();
            assert_eq!(outcome, RuleOutcome::Pass);
        }
    }
}
