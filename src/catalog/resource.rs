// ==========================================
// 表格数据导入系统 - 资源能力接口
// ==========================================

use crate::domain::{CreationField, ModelDescriptor, RequestContext};
use crate::importer::error::ImportResult;
use crate::importer::rules::RuleDeclaration;
use indexmap::IndexMap;

/// 属性 → 原始规则声明（有序）
pub type RuleDeclarations = IndexMap<String, Vec<RuleDeclaration>>;

// ==========================================
// Resource Trait
// ==========================================
// 实现者: DeclaredResource（JSON 声明）或业务代码中的自定义资源
pub trait Resource: Send + Sync {
    /// 资源唯一键
    fn uri_key(&self) -> &str;

    /// 展示名称
    fn label(&self) -> &str;

    /// 是否允许导入
    ///
    /// # 返回
    /// - None: 未声明（视为允许，兼容从未显式声明的资源）
    /// - Some(true / false): 显式声明
    fn importable(&self) -> Option<bool> {
        None
    }

    /// 记录落库目标
    fn model(&self) -> ModelDescriptor;

    /// 创建时可写的字段（按资源声明顺序）
    ///
    /// # 错误
    /// - ResourceIntrospection: 资源无法在空记录上求值字段
    fn creation_fields(&self, ctx: &RequestContext) -> ImportResult<Vec<CreationField>>;

    /// 创建时的校验规则声明
    ///
    /// # 错误
    /// - RuleResolution: 规则声明无法读取
    fn creation_validation_rules(&self, ctx: &RequestContext) -> ImportResult<RuleDeclarations>;
}
