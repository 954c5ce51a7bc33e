// ==========================================
// 表格数据导入系统 - 资源目录
// ==========================================
// 职责: 登记资源句柄，按键查找，按 importable 过滤
// ==========================================

use crate::catalog::declared::CatalogFile;
use crate::catalog::resource::Resource;
use crate::importer::error::{ImportError, ImportResult};
use std::path::Path;
use std::sync::Arc;

#[derive(Default, Clone)]
pub struct ResourceCatalog {
    resources: Vec<Arc<dyn Resource>>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记资源（uri_key 重复时报错）
    pub fn register(&mut self, resource: Arc<dyn Resource>) -> ImportResult<()> {
        if self.find(resource.uri_key()).is_some() {
            return Err(ImportError::CatalogLoad(format!(
                "资源键重复: {}",
                resource.uri_key()
            )));
        }
        self.resources.push(resource);
        Ok(())
    }

    /// 从 JSON 目录文件构建
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ImportError::CatalogLoad(format!("读取目录文件失败 ({}): {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    /// 从 JSON 文本构建
    pub fn from_json_str(raw: &str) -> ImportResult<Self> {
        let file: CatalogFile = serde_json::from_str(raw)
            .map_err(|e| ImportError::CatalogLoad(format!("目录文件格式错误: {}", e)))?;

        let mut catalog = Self::new();
        for resource in file.resources {
            catalog.register(Arc::new(resource))?;
        }
        Ok(catalog)
    }

    /// 全部已登记资源（登记顺序）
    pub fn list(&self) -> &[Arc<dyn Resource>] {
        &self.resources
    }

    /// 可导入资源：importable 未声明或为 true
    pub fn importable(&self) -> impl Iterator<Item = &Arc<dyn Resource>> {
        self.resources
            .iter()
            .filter(|r| r.importable().unwrap_or(true))
    }

    fn find(&self, key: &str) -> Option<&Arc<dyn Resource>> {
        self.resources.iter().find(|r| r.uri_key() == key)
    }

    /// 按键查找可导入资源
    ///
    /// # 错误
    /// - UnknownResource: 未登记
    /// - ResourceNotImportable: 显式声明不可导入
    pub fn resource_for_key(&self, key: &str) -> ImportResult<Arc<dyn Resource>> {
        let resource = self
            .find(key)
            .ok_or_else(|| ImportError::UnknownResource(key.to_string()))?;

        if resource.importable() == Some(false) {
            return Err(ImportError::ResourceNotImportable(key.to_string()));
        }

        Ok(Arc::clone(resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
    {
        "resources": [
            {"uri_key": "users", "label": "Users", "table": "users",
             "fields": [{"attribute": "name", "name": "Name"}]},
            {"uri_key": "audit-logs", "label": "Audit Logs", "table": "audit_logs",
             "importable": false, "fields": []},
            {"uri_key": "teams", "label": "Teams", "table": "teams",
             "importable": true, "fields": []}
        ]
    }
    "#;

    #[test]
    fn test_importable_defaults_to_true() {
        let catalog = ResourceCatalog::from_json_str(CATALOG).unwrap();

        let keys: Vec<_> = catalog.importable().map(|r| r.uri_key().to_string()).collect();
        assert_eq!(keys, vec!["users", "teams"]);
        assert_eq!(catalog.list().len(), 3);
    }

    #[test]
    fn test_resource_for_key() {
        let catalog = ResourceCatalog::from_json_str(CATALOG).unwrap();

        assert_eq!(catalog.resource_for_key("users").unwrap().label(), "Users");
        assert!(matches!(
            catalog.resource_for_key("ghosts"),
            Err(ImportError::UnknownResource(_))
        ));
        assert!(matches!(
            catalog.resource_for_key("audit-logs"),
            Err(ImportError::ResourceNotImportable(_))
        ));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let raw = r#"{"resources": [
            {"uri_key": "users", "label": "A", "table": "users", "fields": []},
            {"uri_key": "users", "label": "B", "table": "users", "fields": []}
        ]}"#;

        assert!(matches!(
            ResourceCatalog::from_json_str(raw),
            Err(ImportError::CatalogLoad(_))
        ));
    }
}
