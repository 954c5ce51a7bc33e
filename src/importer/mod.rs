// ==========================================
// 表格数据导入系统 - 导入层
// ==========================================
// 职责: 预览 → 规则编译 → 逐行导入 → 结果汇总
// 支持: CSV, Excel/ODS
// ==========================================

// 模块声明
pub mod column_mapper;
pub mod error;
pub mod file_parser;
pub mod import_engine;
pub mod preview_engine;
pub mod report;
pub mod rule_compiler;
pub mod rules;
pub mod traits;
pub mod validator;

// 重导出核心类型
pub use column_mapper::ColumnMapper;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use import_engine::{ImportEngine, ImportJob};
pub use preview_engine::PreviewEngine;
pub use report::ResultReporter;
pub use rule_compiler::{CompiledRule, CompiledRuleSet, RuleCompiler, RuleFactory};
pub use rules::{Rule, RuleDeclaration, RuleInput, RuleOutcome};
pub use validator::{RowValidator, ValidationErrors};

// 重导出 Trait 接口
pub use traits::TabularReader;
