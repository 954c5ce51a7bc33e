// ==========================================
// 表格数据导入系统 - 资源相关值对象
// ==========================================
// 职责: 可写字段 / 列映射 / 模型描述 / 请求上下文
// ==========================================

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ==========================================
// CreationField - 资源的一个可写字段
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreationField {
    /// 展示名称
    pub name: String,
    /// 存储键（属性名）
    pub attribute: String,
}

impl CreationField {
    pub fn new(attribute: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute: attribute.into(),
        }
    }
}

// ==========================================
// ModelDescriptor - 记录落库目标
// ==========================================
// 由资源在目录构建时给出，导入时不做按名反射
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// 目标表名
    pub table: String,
}

impl ModelDescriptor {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
        }
    }
}

// ==========================================
// ColumnMapping - 源列 → 目标属性
// ==========================================
// 未映射的列不出现在映射中
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping(IndexMap<String, String>);

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一条映射（同一列重复添加时后者覆盖前者）
    pub fn insert(&mut self, column: impl Into<String>, attribute: impl Into<String>) {
        self.0.insert(column.into(), attribute.into());
    }

    /// 按列名查找目标属性
    pub fn attribute_for(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(c, a)| (c.as_str(), a.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<C, A> FromIterator<(C, A)> for ColumnMapping
where
    C: Into<String>,
    A: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (C, A)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(c, a)| (c.into(), a.into()))
                .collect(),
        )
    }
}

// ==========================================
// RequestContext - 请求上下文
// ==========================================
// 资源在生成字段/规则时可读取（例如按当前资源键区分规则）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// 当前操作的资源键（预览时为 None）
    pub resource_key: Option<String>,
}

impl RequestContext {
    pub fn for_resource(key: impl Into<String>) -> Self {
        Self {
            resource_key: Some(key.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_mapping_lookup() {
        let mapping: ColumnMapping = [("Email", "email"), ("Name", "name")]
            .into_iter()
            .collect();

        assert_eq!(mapping.attribute_for("Email"), Some("email"));
        assert_eq!(mapping.attribute_for("Phone"), None);
        assert_eq!(mapping.len(), 2);
    }

    #[test]
    fn test_column_mapping_deserializes_from_plain_object() {
        let mapping: ColumnMapping =
            serde_json::from_str(r#"{"Full Name":"name","E-Mail":"email"}"#).unwrap();

        let pairs: Vec<_> = mapping.iter().collect();
        assert_eq!(pairs, vec![("Full Name", "name"), ("E-Mail", "email")]);
    }
}
