// ==========================================
// 表格数据导入系统 - JSON 声明式资源
// ==========================================
// 目录文件格式:
// {
//   "resources": [
//     { "uri_key": "users", "label": "Users", "table": "users",
//       "importable": true,
//       "fields": [
//         { "attribute": "email", "name": "E-Mail", "rules": ["required", "email|unique:users,email"] }
//       ] }
//   ]
// }
// 规则可写成数组，也可在一个字符串里用 '|' 分隔
// regex 规则自身可含 '|'：从 "regex:" 起到该字符串末尾整体作为一条规则，
// 因此 regex 须是所在字符串的最后一条（单独写成数组元素最稳妥）
// ==========================================

use crate::catalog::resource::{Resource, RuleDeclarations};
use crate::domain::{CreationField, ModelDescriptor, RequestContext};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::rules::RuleDeclaration;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub resources: Vec<DeclaredResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredField {
    pub attribute: String,
    pub name: String,
    #[serde(default)]
    pub rules: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredResource {
    pub uri_key: String,
    pub label: String,
    #[serde(default)]
    pub importable: Option<bool>,
    pub table: String,
    pub fields: Vec<DeclaredField>,
}

impl DeclaredResource {
    /// 字段声明自检：属性名非空且不重复
    fn check_fields(&self) -> ImportResult<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            let attribute = field.attribute.trim();
            if attribute.is_empty() {
                return Err(ImportError::ResourceIntrospection {
                    resource: self.uri_key.clone(),
                    message: format!("字段 {} 缺少属性名", field.name),
                });
            }
            if !seen.insert(attribute) {
                return Err(ImportError::ResourceIntrospection {
                    resource: self.uri_key.clone(),
                    message: format!("属性重复: {}", attribute),
                });
            }
        }
        Ok(())
    }
}

/// 拆分一条规则字符串；"regex:" 之后的内容不再按 '|' 拆分
fn split_rule_entry(entry: &str) -> Vec<&str> {
    let starts_rule = |pos: usize| {
        let before = entry[..pos].trim_end();
        before.is_empty() || before.ends_with('|')
    };
    let (head, pattern) = match entry.find("regex:") {
        Some(pos) if starts_rule(pos) => (&entry[..pos], Some(&entry[pos..])),
        _ => (entry, None),
    };

    head.split('|').chain(pattern).collect()
}

impl Resource for DeclaredResource {
    fn uri_key(&self) -> &str {
        &self.uri_key
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn importable(&self) -> Option<bool> {
        self.importable
    }

    fn model(&self) -> ModelDescriptor {
        ModelDescriptor::new(self.table.clone())
    }

    fn creation_fields(&self, _ctx: &RequestContext) -> ImportResult<Vec<CreationField>> {
        self.check_fields()?;

        Ok(self
            .fields
            .iter()
            .map(|f| CreationField::new(f.attribute.trim(), f.name.clone()))
            .collect())
    }

    fn creation_validation_rules(&self, _ctx: &RequestContext) -> ImportResult<RuleDeclarations> {
        let mut declarations = RuleDeclarations::new();

        for field in self.fields.iter().filter(|f| !f.rules.is_empty()) {
            let rules = field
                .rules
                .iter()
                .flat_map(|r| split_rule_entry(r))
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(RuleDeclaration::named)
                .collect::<Vec<_>>();
            declarations.insert(field.attribute.trim().to_string(), rules);
        }

        Ok(declarations)
    }
}
