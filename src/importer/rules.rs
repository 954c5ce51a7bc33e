// ==========================================
// 表格数据导入系统 - 校验规则
// ==========================================
// 职责: 定义单条校验规则接口 + 内置规则
// 规则声明形如 "required" / "max:255" / "in:a,b" / "unique:users,email"
// ==========================================
// 状态说明:
// - unique / exists 持有 RecordQuery 游标，执行时会向游标追加过滤条件
// - 这类规则是"一行一用"的，跨行复用会把上一行的条件带到下一行
// - 规则编译器只产出工厂，每行通过 fresh() 拿到已重置的新实例
// ==========================================

use crate::domain::row::is_blank;
use crate::domain::Record;
use crate::repository::query::quote_identifier;
use crate::repository::{RecordQuery, RecordStorage, RepositoryResult};
use async_trait::async_trait;
use regex::Regex;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// 单条规则的执行结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Pass,
    Fail(String),
}

/// 规则执行输入
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    /// 属性名
    pub attribute: &'a str,
    /// 属性值（None 表示记录中无该属性）
    pub value: Option<&'a str>,
    /// 整条投影记录（跨字段规则可用）
    pub record: &'a Record,
}

impl RuleInput<'_> {
    /// 值为空（缺失或空白）
    pub fn is_empty(&self) -> bool {
        self.value.map(is_blank).unwrap_or(true)
    }

    /// 去空白后的值
    pub fn trimmed(&self) -> &str {
        self.value.map(str::trim).unwrap_or("")
    }
}

// ==========================================
// Rule Trait
// ==========================================
#[async_trait]
pub trait Rule: Send + Sync + fmt::Debug {
    /// 规则名（用于日志）
    fn name(&self) -> &str;

    /// 隐式规则在值为空时也执行（如 required）；其余规则遇空值跳过
    fn is_implicit(&self) -> bool {
        false
    }

    /// 是否携带跨调用的可变状态（查询游标等）
    fn is_stateful(&self) -> bool {
        false
    }

    /// 产出一个可独立使用的新实例，内部状态必须处于初始状态
    fn fresh(&self) -> Box<dyn Rule>;

    /// 执行校验
    ///
    /// # 返回
    /// - Ok(RuleOutcome): 通过 / 失败消息
    /// - Err: 查询存储失败（按行级异常处理）
    async fn check(
        &mut self,
        input: &RuleInput<'_>,
        storage: &dyn RecordStorage,
    ) -> RepositoryResult<RuleOutcome>;
}

/// 资源声明的原始规则
#[derive(Clone)]
pub enum RuleDeclaration {
    /// 文本形式的内置规则
    Named(String),
    /// 资源自带的规则对象（可能有状态）
    Custom(Arc<dyn Rule>),
}

impl RuleDeclaration {
    pub fn named(token: impl Into<String>) -> Self {
        RuleDeclaration::Named(token.into())
    }

    pub fn custom<R: Rule + 'static>(rule: R) -> Self {
        RuleDeclaration::Custom(Arc::new(rule))
    }
}

impl fmt::Debug for RuleDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleDeclaration::Named(token) => write!(f, "Named({})", token),
            RuleDeclaration::Custom(rule) => write!(f, "Custom({})", rule.name()),
        }
    }
}

// ==========================================
// 无状态内置规则
// ==========================================

#[derive(Debug, Clone)]
pub struct RequiredRule;

#[async_trait]
impl Rule for RequiredRule {
    fn name(&self) -> &str {
        "required"
    }

    fn is_implicit(&self) -> bool {
        true
    }

    fn fresh(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }

    async fn check(
        &mut self,
        input: &RuleInput<'_>,
        _storage: &dyn RecordStorage,
    ) -> RepositoryResult<RuleOutcome> {
        Ok(if input.is_empty() {
            RuleOutcome::Fail(format!("{} 不能为空", input.attribute))
        } else {
            RuleOutcome::Pass
        })
    }
}

/// 标记性规则：nullable / string（单元格本身即字符串）
#[derive(Debug, Clone)]
pub struct PassRule(&'static str);

#[async_trait]
impl Rule for PassRule {
    fn name(&self) -> &str {
        self.0
    }

    fn fresh(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }

    async fn check(
        &mut self,
        _input: &RuleInput<'_>,
        _storage: &dyn RecordStorage,
    ) -> RepositoryResult<RuleOutcome> {
        Ok(RuleOutcome::Pass)
    }
}

#[derive(Debug, Clone)]
pub struct NumericRule {
    integer: bool,
}

#[async_trait]
impl Rule for NumericRule {
    fn name(&self) -> &str {
        if self.integer {
            "integer"
        } else {
            "numeric"
        }
    }

    fn fresh(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }

    async fn check(
        &mut self,
        input: &RuleInput<'_>,
        _storage: &dyn RecordStorage,
    ) -> RepositoryResult<RuleOutcome> {
        let value = input.trimmed();
        let ok = if self.integer {
            value.parse::<i64>().is_ok()
        } else {
            value.parse::<f64>().map(f64::is_finite).unwrap_or(false)
        };

        Ok(if ok {
            RuleOutcome::Pass
        } else if self.integer {
            RuleOutcome::Fail(format!("{} 必须是整数", input.attribute))
        } else {
            RuleOutcome::Fail(format!("{} 必须是数字", input.attribute))
        })
    }
}

#[derive(Debug, Clone)]
pub struct BooleanRule;

#[async_trait]
impl Rule for BooleanRule {
    fn name(&self) -> &str {
        "boolean"
    }

    fn fresh(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }

    async fn check(
        &mut self,
        input: &RuleInput<'_>,
        _storage: &dyn RecordStorage,
    ) -> RepositoryResult<RuleOutcome> {
        let ok = matches!(
            input.trimmed().to_lowercase().as_str(),
            "true" | "false" | "1" | "0"
        );
        Ok(if ok {
            RuleOutcome::Pass
        } else {
            RuleOutcome::Fail(format!("{} 必须是布尔值", input.attribute))
        })
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email 正则常量"))
}

#[derive(Debug, Clone)]
pub struct EmailRule;

#[async_trait]
impl Rule for EmailRule {
    fn name(&self) -> &str {
        "email"
    }

    fn fresh(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }

    async fn check(
        &mut self,
        input: &RuleInput<'_>,
        _storage: &dyn RecordStorage,
    ) -> RepositoryResult<RuleOutcome> {
        Ok(if email_regex().is_match(input.trimmed()) {
            RuleOutcome::Pass
        } else {
            RuleOutcome::Fail(format!("{} 不是有效的邮箱地址", input.attribute))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeBound {
    Min,
    Max,
}

/// min / max：同一属性声明了 numeric/integer 时比较数值，否则比较字符长度
#[derive(Debug, Clone)]
pub struct SizeRule {
    bound: SizeBound,
    limit: f64,
    numeric: bool,
}

#[async_trait]
impl Rule for SizeRule {
    fn name(&self) -> &str {
        match self.bound {
            SizeBound::Min => "min",
            SizeBound::Max => "max",
        }
    }

    fn fresh(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }

    async fn check(
        &mut self,
        input: &RuleInput<'_>,
        _storage: &dyn RecordStorage,
    ) -> RepositoryResult<RuleOutcome> {
        let value = input.trimmed();
        let size = if self.numeric {
            match value.parse::<f64>() {
                Ok(n) => n,
                // 非数字由 numeric 规则报错，这里不重复
                Err(_) => return Ok(RuleOutcome::Pass),
            }
        } else {
            value.chars().count() as f64
        };

        let ok = match self.bound {
            SizeBound::Min => size >= self.limit,
            SizeBound::Max => size <= self.limit,
        };
        if ok {
            return Ok(RuleOutcome::Pass);
        }

        let message = match (self.bound, self.numeric) {
            (SizeBound::Min, true) => format!("{} 不能小于 {}", input.attribute, self.limit),
            (SizeBound::Max, true) => format!("{} 不能大于 {}", input.attribute, self.limit),
            (SizeBound::Min, false) => {
                format!("{} 至少 {} 个字符", input.attribute, self.limit)
            }
            (SizeBound::Max, false) => {
                format!("{} 不能超过 {} 个字符", input.attribute, self.limit)
            }
        };
        Ok(RuleOutcome::Fail(message))
    }
}

#[derive(Debug, Clone)]
pub struct InRule {
    allowed: Vec<String>,
}

#[async_trait]
impl Rule for InRule {
    fn name(&self) -> &str {
        "in"
    }

    fn fresh(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }

    async fn check(
        &mut self,
        input: &RuleInput<'_>,
        _storage: &dyn RecordStorage,
    ) -> RepositoryResult<RuleOutcome> {
        let value = input.trimmed();
        Ok(if self.allowed.iter().any(|a| a == value) {
            RuleOutcome::Pass
        } else {
            RuleOutcome::Fail(format!(
                "{} 必须是以下值之一: {}",
                input.attribute,
                self.allowed.join(", ")
            ))
        })
    }
}

#[derive(Debug, Clone)]
pub struct RegexRule {
    pattern: Regex,
}

#[async_trait]
impl Rule for RegexRule {
    fn name(&self) -> &str {
        "regex"
    }

    fn fresh(&self) -> Box<dyn Rule> {
        Box::new(self.clone())
    }

    async fn check(
        &mut self,
        input: &RuleInput<'_>,
        _storage: &dyn RecordStorage,
    ) -> RepositoryResult<RuleOutcome> {
        Ok(if self.pattern.is_match(input.trimmed()) {
            RuleOutcome::Pass
        } else {
            RuleOutcome::Fail(format!("{} 格式不正确", input.attribute))
        })
    }
}

// ==========================================
// 有状态规则（持有查询游标）
// ==========================================

/// unique:table,column : 存储中不得已有相同值
#[derive(Debug, Clone)]
pub struct UniqueRule {
    query: RecordQuery,
    column: String,
}

impl UniqueRule {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            query: RecordQuery::table(table),
            column: column.into(),
        }
    }

    pub fn query(&self) -> &RecordQuery {
        &self.query
    }
}

#[async_trait]
impl Rule for UniqueRule {
    fn name(&self) -> &str {
        "unique"
    }

    fn is_stateful(&self) -> bool {
        true
    }

    fn fresh(&self) -> Box<dyn Rule> {
        Box::new(Self {
            query: self.query.new_query(),
            column: self.column.clone(),
        })
    }

    async fn check(
        &mut self,
        input: &RuleInput<'_>,
        storage: &dyn RecordStorage,
    ) -> RepositoryResult<RuleOutcome> {
        self.query.where_eq(self.column.clone(), input.trimmed());
        let count = storage.count(&self.query).await?;

        Ok(if count == 0 {
            RuleOutcome::Pass
        } else {
            RuleOutcome::Fail(format!("{} 已存在: {}", input.attribute, input.trimmed()))
        })
    }
}

/// exists:table,column : 关联记录必须存在
#[derive(Debug, Clone)]
pub struct ExistsRule {
    query: RecordQuery,
    column: String,
}

impl ExistsRule {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            query: RecordQuery::table(table),
            column: column.into(),
        }
    }

    pub fn query(&self) -> &RecordQuery {
        &self.query
    }
}

#[async_trait]
impl Rule for ExistsRule {
    fn name(&self) -> &str {
        "exists"
    }

    fn is_stateful(&self) -> bool {
        true
    }

    fn fresh(&self) -> Box<dyn Rule> {
        Box::new(Self {
            query: self.query.new_query(),
            column: self.column.clone(),
        })
    }

    async fn check(
        &mut self,
        input: &RuleInput<'_>,
        storage: &dyn RecordStorage,
    ) -> RepositoryResult<RuleOutcome> {
        self.query.where_eq(self.column.clone(), input.trimmed());
        let count = storage.count(&self.query).await?;

        Ok(if count > 0 {
            RuleOutcome::Pass
        } else {
            RuleOutcome::Fail(format!(
                "{} 关联记录不存在: {}",
                input.attribute,
                input.trimmed()
            ))
        })
    }
}

// ==========================================
// 文本规则解析
// ==========================================

/// 解析一条文本规则
///
/// # 参数
/// - token: 规则文本（不含 '|'）
/// - attribute: 所属属性（unique/exists 省略列名时使用）
/// - numeric: 同属性是否声明了 numeric/integer（影响 min/max 语义）
///
/// # 返回
/// - Err(String): 未知规则或参数非法
pub fn parse_named_rule(
    token: &str,
    attribute: &str,
    numeric: bool,
) -> Result<Box<dyn Rule>, String> {
    let token = token.trim();
    let (name, args) = match token.split_once(':') {
        Some((name, args)) => (name.trim(), Some(args)),
        None => (token, None),
    };

    let require_args = || -> Result<&str, String> {
        args.map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| format!("规则 {} 缺少参数", name))
    };

    let rule: Box<dyn Rule> = match name {
        "required" => Box::new(RequiredRule),
        "nullable" => Box::new(PassRule("nullable")),
        "string" => Box::new(PassRule("string")),
        "numeric" => Box::new(NumericRule { integer: false }),
        "integer" => Box::new(NumericRule { integer: true }),
        "boolean" => Box::new(BooleanRule),
        "email" => Box::new(EmailRule),
        "min" | "max" => {
            let raw = require_args()?;
            let limit = raw
                .parse::<f64>()
                .map_err(|_| format!("规则 {} 参数不是数字: {}", name, raw))?;
            let bound = if name == "min" {
                SizeBound::Min
            } else {
                SizeBound::Max
            };
            Box::new(SizeRule {
                bound,
                limit,
                numeric,
            })
        }
        "in" => {
            let allowed = require_args()?
                .split(',')
                .map(|s| s.trim().to_string())
                .collect();
            Box::new(InRule { allowed })
        }
        "regex" => {
            // 正则本身可能包含 ':'，取第一个 ':' 之后的全部内容
            let raw = require_args()?;
            let pattern = Regex::new(raw).map_err(|e| format!("正则非法: {}", e))?;
            Box::new(RegexRule { pattern })
        }
        "unique" | "exists" => {
            let raw = require_args()?;
            let mut parts = raw.split(',').map(str::trim);
            let table = parts
                .next()
                .filter(|t| !t.is_empty())
                .ok_or_else(|| format!("规则 {} 缺少表名", name))?;
            let column = parts
                .next()
                .filter(|c| !c.is_empty())
                .unwrap_or(attribute);
            // 表名 / 列名须为合法标识符
            for ident in [table, column] {
                quote_identifier(ident)
                    .map_err(|e| format!("规则 {} 参数非法: {}", name, e))?;
            }
            if name == "unique" {
                Box::new(UniqueRule::new(table, column))
            } else {
                Box::new(ExistsRule::new(table, column))
            }
        }
        "" => return Err("空规则".to_string()),
        other => return Err(format!("未知规则: {}", other)),
    };

    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelDescriptor;
    use crate::repository::RepositoryError;
    use std::sync::Mutex;

    /// 记录每次 count 收到的查询，返回固定计数
    #[derive(Default)]
    struct RecordingStorage {
        seen: Mutex<Vec<RecordQuery>>,
        count: u64,
    }

    #[async_trait]
    impl RecordStorage for RecordingStorage {
        async fn create(&self, _model: &ModelDescriptor, _values: &Record) -> RepositoryResult<i64> {
            Err(RepositoryError::InternalError("not used".to_string()))
        }

        async fn count(&self, query: &RecordQuery) -> RepositoryResult<u64> {
            self.seen.lock().unwrap().push(query.clone());
            Ok(self.count)
        }
    }

    fn input<'a>(attribute: &'a str, value: Option<&'a str>, record: &'a Record) -> RuleInput<'a> {
        RuleInput {
            attribute,
            value,
            record,
        }
    }

    #[tokio::test]
    async fn test_required_rule() {
        let storage = RecordingStorage::default();
        let record = Record::new();
        let mut rule = RequiredRule;

        let missing = rule.check(&input("name", None, &record), &storage).await.unwrap();
        let blank = rule.check(&input("name", Some("  "), &record), &storage).await.unwrap();
        let present = rule.check(&input("name", Some("Ada"), &record), &storage).await.unwrap();

        assert!(matches!(missing, RuleOutcome::Fail(_)));
        assert!(matches!(blank, RuleOutcome::Fail(_)));
        assert_eq!(present, RuleOutcome::Pass);
    }

    #[tokio::test]
    async fn test_max_is_length_or_value_depending_on_numeric() {
        let storage = RecordingStorage::default();
        let record = Record::new();

        let mut length = parse_named_rule("max:3", "code", false).unwrap();
        let mut value = parse_named_rule("max:3", "qty", true).unwrap();

        assert!(matches!(
            length.check(&input("code", Some("abcd"), &record), &storage).await.unwrap(),
            RuleOutcome::Fail(_)
        ));
        assert_eq!(
            value.check(&input("qty", Some("3"), &record), &storage).await.unwrap(),
            RuleOutcome::Pass
        );
        assert!(matches!(
            value.check(&input("qty", Some("12"), &record), &storage).await.unwrap(),
            RuleOutcome::Fail(_)
        ));
    }

    #[tokio::test]
    async fn test_in_email_numeric_rules() {
        let storage = RecordingStorage::default();
        let record = Record::new();

        let mut in_rule = parse_named_rule("in:draft, published", "status", false).unwrap();
        let mut email = parse_named_rule("email", "email", false).unwrap();
        let mut integer = parse_named_rule("integer", "age", false).unwrap();

        assert_eq!(
            in_rule.check(&input("status", Some("published"), &record), &storage).await.unwrap(),
            RuleOutcome::Pass
        );
        assert!(matches!(
            in_rule.check(&input("status", Some("archived"), &record), &storage).await.unwrap(),
            RuleOutcome::Fail(_)
        ));
        assert!(matches!(
            email.check(&input("email", Some("not-an-email"), &record), &storage).await.unwrap(),
            RuleOutcome::Fail(_)
        ));
        assert!(matches!(
            integer.check(&input("age", Some("4.5"), &record), &storage).await.unwrap(),
            RuleOutcome::Fail(_)
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_and_malformed() {
        assert!(parse_named_rule("sometimes_maybe", "x", false).is_err());
        assert!(parse_named_rule("max", "x", false).is_err());
        assert!(parse_named_rule("max:abc", "x", false).is_err());
        assert!(parse_named_rule("unique:", "x", false).is_err());
        assert!(parse_named_rule("regex:([a-z", "x", false).is_err());
    }

    #[tokio::test]
    async fn test_exists_rule_defaults_column_to_attribute() {
        let storage = RecordingStorage {
            count: 1,
            ..Default::default()
        };
        let record = Record::new();
        let mut rule = parse_named_rule("exists:teams", "team_id", false).unwrap();

        rule.check(&input("team_id", Some("7"), &record), &storage).await.unwrap();

        let seen = storage.seen.lock().unwrap();
        assert_eq!(seen[0].table_name(), "teams");
        assert_eq!(seen[0].filters()[0].column, "team_id");
    }

    #[tokio::test]
    async fn test_reused_exists_rule_accumulates_filters() {
        // 同一实例跨行复用时，第二次查询会带上第一行的条件
        let storage = RecordingStorage {
            count: 1,
            ..Default::default()
        };
        let record = Record::new();
        let mut rule = ExistsRule::new("teams", "id");

        rule.check(&input("team_id", Some("1"), &record), &storage).await.unwrap();
        rule.check(&input("team_id", Some("2"), &record), &storage).await.unwrap();

        let seen = storage.seen.lock().unwrap();
        assert_eq!(seen[1].filters().len(), 2);
    }

    #[tokio::test]
    async fn test_fresh_resets_query_state() {
        let storage = RecordingStorage {
            count: 1,
            ..Default::default()
        };
        let record = Record::new();
        let mut rule = UniqueRule::new("users", "email");
        rule.check(&input("email", Some("a@example.com"), &record), &storage)
            .await
            .unwrap();
        assert_eq!(rule.query().filters().len(), 1);

        let mut fresh = rule.fresh();
        assert!(fresh.is_stateful());
        fresh
            .check(&input("email", Some("b@example.com"), &record), &storage)
            .await
            .unwrap();

        let seen = storage.seen.lock().unwrap();
        assert_eq!(seen[1].filters().len(), 1);
        assert_eq!(seen[1].filters()[0].value, "b@example.com");
    }
}
