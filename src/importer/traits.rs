// ==========================================
// 表格数据导入系统 - 导入层 Trait
// ==========================================
// 职责: 定义导入管道依赖的外部能力接口（不包含实现）
// ==========================================

use crate::domain::Row;
use crate::importer::error::ImportResult;
use std::path::Path;

// ==========================================
// TabularReader Trait
// ==========================================
// 用途: 把已存储的文件转换为有序的行序列
// 实现者: CsvParser / ExcelParser / UniversalFileParser
pub trait TabularReader: Send + Sync {
    /// 读取文件全部数据行
    ///
    /// # 参数
    /// - path: 文件路径（由调用方解析好的不透明句柄）
    ///
    /// # 返回
    /// - Ok(Vec<Row>): 数据行（不含表头），每行包含全部列标题
    /// - Err: 文件缺失 / 格式不支持 / 解析失败
    ///
    /// # 约束
    /// - 文件句柄在调用内获取并释放
    /// - 重复读取同一未变化文件结果一致
    fn read(&self, path: &Path) -> ImportResult<Vec<Row>>;
}
