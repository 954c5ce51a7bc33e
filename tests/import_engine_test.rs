// ==========================================
// ImportEngine 集成测试
// ==========================================
// 测试目标: 逐行 映射 → 校验 → 落库，部分失败不中断
// ==========================================


use std::sync::Arc;
use tabular_import::domain::{ColumnMapping, RequestContext};
use tabular_import::importer::{
    CompiledRuleSet, ImportEngine, ImportError, ImportJob, RuleCompiler, UniversalFileParser,
};
use tabular_import::logging;
use test_helpers::{catalog, TestEnv};

fn engine(env: &TestEnv) -> ImportEngine {
    ImportEngine::new(Arc::new(UniversalFileParser), Arc::new(env.storage()))
}

/// 按资源组装 ImportJob
fn job(resource_key: &str, mapping: ColumnMapping, validate: bool) -> ImportJob {
    let catalog = catalog();
    let resource = catalog.resource_for_key(resource_key).unwrap();
    let ctx = RequestContext::for_resource(resource_key);

    let attributes = resource
        .creation_fields(&ctx)
        .unwrap()
        .into_iter()
        .map(|f| f.attribute);
    let rules = if validate {
        RuleCompiler::compile(resource.as_ref(), &ctx).unwrap()
    } else {
        CompiledRuleSet::empty()
    };

    ImportJob::new(resource.uri_key(), resource.model())
        .with_attributes(attributes)
        .with_mapping(mapping)
        .with_rules(rules)
}

fn user_mapping() -> ColumnMapping {
    [("Full Name", "name"), ("E-Mail", "email")]
        .into_iter()
        .collect()
}

#[tokio::test]
async fn test_partial_failure_is_tolerated() {
    logging::init_test();
    let env = TestEnv::new().unwrap();
    let path = env.write_file(
        "users.csv",
        "Full Name,E-Mail\n\
         Alice,alice@example.com\n\
         ,bob@example.com\n\
         Carol,alice@example.com\n",
    );

    let outcome = engine(&env)
        .import(&job("users", user_mapping(), true), &path)
        .await
        .unwrap();

    assert_eq!(outcome.total_rows, 3);
    assert_eq!(outcome.imported(), 1);

    // 第 1 行：name 必填未通过
    assert_eq!(outcome.failures.len(), 1);
    let failure = &outcome.failures[0];
    assert_eq!(failure.row, 1);
    assert_eq!(failure.errors.keys().collect::<Vec<_>>(), vec!["name"]);
    assert_eq!(failure.values["email"], "bob@example.com");

    // 第 2 行：email 唯一约束由数据库拒绝
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].row, 2);
    assert!(outcome.errors[0].message.contains("唯一约束"));

    assert_eq!(env.user_names(), vec![Some("Alice".to_string())]);
}

#[tokio::test]
async fn test_blank_rows_do_not_consume_row_indices() {
    let env = TestEnv::new().unwrap();
    let path = env.write_file(
        "users.csv",
        "Full Name,E-Mail\n\
         Alice,alice@example.com\n\
         ,\n\
         ,bob@example.com\n",
    );

    let outcome = engine(&env)
        .import(&job("users", user_mapping(), true), &path)
        .await
        .unwrap();

    // 空白行被跳过，行号按数据行计数（不是文件物理行号）
    assert_eq!(outcome.total_rows, 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].row, 1);
    assert_eq!(outcome.failures[0].values["email"], "bob@example.com");
    assert_eq!(env.count("users"), 1);
}

#[tokio::test]
async fn test_validation_off_sends_everything_to_storage() {
    let env = TestEnv::new().unwrap();
    let path = env.write_file(
        "users.csv",
        "Full Name,E-Mail\n\
         Alice,not-an-email\n\
         ,bob@example.com\n",
    );

    let outcome = engine(&env)
        .import(&job("users", user_mapping(), false), &path)
        .await
        .unwrap();

    // 邮箱格式不校验，直接写入；空 name 由 NOT NULL 约束拒绝
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].row, 1);
    assert_eq!(env.count("users"), 1);
}

#[tokio::test]
async fn test_stateful_rules_do_not_leak_between_rows() {
    let env = TestEnv::new().unwrap();
    let path = env.write_file(
        "members.csv",
        "Name,Email,Team\n\
         Alice,alice@example.com,ghosts\n\
         Bob,bob@example.com,core\n\
         Carol,carol@example.com,ops\n",
    );
    let mapping: ColumnMapping = [("Name", "name"), ("Email", "email"), ("Team", "team")]
        .into_iter()
        .collect();

    let outcome = engine(&env)
        .import(&job("members", mapping, true), &path)
        .await
        .unwrap();

    // 只有第 0 行的 team 不存在；后续行的 exists 查询不带上一行的条件
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].row, 0);
    assert!(outcome.failures[0].errors.contains_key("team"));
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.imported(), 2);
}

#[tokio::test]
async fn test_unique_rule_sees_rows_written_earlier_in_same_run() {
    let env = TestEnv::new().unwrap();
    let path = env.write_file(
        "members.csv",
        "Name,Email\n\
         Alice,alice@example.com\n\
         Alice Again,alice@example.com\n",
    );
    let mapping: ColumnMapping = [("Name", "name"), ("Email", "email")].into_iter().collect();

    let outcome = engine(&env)
        .import(&job("members", mapping, true), &path)
        .await
        .unwrap();

    // 重复值在校验阶段就被拦下，而不是落到数据库约束
    assert!(outcome.errors.is_empty());
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].row, 1);
    assert_eq!(
        outcome.failures[0].messages().collect::<Vec<_>>(),
        vec!["email 已存在: alice@example.com"]
    );
}

#[tokio::test]
async fn test_mapping_outside_allow_list_is_dropped() {
    let env = TestEnv::new().unwrap();
    let path = env.write_file(
        "users.csv",
        "Full Name,E-Mail,Secret\n\
         Alice,alice@example.com,s3cr3t\n",
    );
    let mapping: ColumnMapping = [("Full Name", "name"), ("E-Mail", "email"), ("Secret", "id")]
        .into_iter()
        .collect();

    let outcome = engine(&env)
        .import(&job("users", mapping, true), &path)
        .await
        .unwrap();

    assert!(!outcome.has_problems());
    assert_eq!(env.count("users"), 1);
}

#[tokio::test]
async fn test_unmapped_columns_are_ignored() {
    let env = TestEnv::new().unwrap();
    let path = env.write_file(
        "users.csv",
        "Full Name,E-Mail,Notes\n\
         Alice,,anything\n",
    );
    let mapping: ColumnMapping = [("Full Name", "name")].into_iter().collect();

    let outcome = engine(&env)
        .import(&job("users", mapping, true), &path)
        .await
        .unwrap();

    assert!(!outcome.has_problems());
    assert_eq!(env.user_names(), vec![Some("Alice".to_string())]);
}

#[tokio::test]
async fn test_header_only_file_imports_nothing() {
    let env = TestEnv::new().unwrap();
    let path = env.write_file("empty.csv", "Full Name,E-Mail\n");

    let outcome = engine(&env)
        .import(&job("users", user_mapping(), true), &path)
        .await
        .unwrap();

    assert_eq!(outcome.total_rows, 0);
    assert!(!outcome.has_problems());
    assert_eq!(env.count("users"), 0);
}

#[tokio::test]
async fn test_unreadable_file_aborts_before_any_row() {
    let env = TestEnv::new().unwrap();
    let path = env.write_file("users.pdf", "%PDF-1.4");

    let result = engine(&env)
        .import(&job("users", user_mapping(), true), &path)
        .await;

    assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    assert_eq!(env.count("users"), 0);
}
