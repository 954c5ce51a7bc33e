// ==========================================
// 表格数据导入系统 - 行模型
// ==========================================
// Row: 表格读取器产出的一行（表头 → 原始单元格值）
// Record: 经列映射投影后的一行（属性名 → 值）
// 两者都保持插入顺序，表头顺序即文件列顺序
// ==========================================

use indexmap::IndexMap;

/// 文件中的一行数据（列标题 → 原始值）
pub type Row = IndexMap<String, String>;

/// 投影后的待写入记录（属性名 → 值）
pub type Record = IndexMap<String, String>;

/// 判断单元格值是否视为"空"（空串或全空白）
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("   "));
        assert!(!is_blank(" a "));
    }
}
