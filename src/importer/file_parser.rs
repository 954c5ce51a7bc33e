// ==========================================
// 表格数据导入系统 - 文件解析器实现
// ==========================================
// 支持: CSV (.csv/.txt) / 表格 (.xlsx/.xlsm/.xls/.ods)
// 约定:
// - 第一行为表头，表头与单元格均 TRIM
// - 空表头补为 column_N，重复表头追加 _2/_3 后缀
// - 数据行短于表头时补空串，保证每行包含全部列
// - 完全空白的行跳过
// ==========================================

use crate::domain::Row;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::traits::TabularReader;
use calamine::{open_workbook_auto, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

const CSV_EXTENSIONS: &[&str] = &["csv", "txt"];
const SHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

/// 规范化表头：TRIM、补空表头、重复表头加后缀
fn normalize_headers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashMap<String, usize> = HashMap::new();

    raw.into_iter()
        .enumerate()
        .map(|(idx, h)| {
            let trimmed = h.as_ref().trim();
            let base = if trimmed.is_empty() {
                format!("column_{}", idx + 1)
            } else {
                trimmed.to_string()
            };

            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{}_{}", base, count)
            }
        })
        .collect()
}

/// 按表头组装一行；返回 None 表示整行空白
fn build_row<I, S>(headers: &[String], cells: I) -> Option<Row>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cells = cells.into_iter();
    let row: Row = headers
        .iter()
        .map(|h| {
            let value = cells
                .next()
                .map(|c| c.as_ref().trim().to_string())
                .unwrap_or_default();
            (h.clone(), value)
        })
        .collect();

    if row.values().all(|v| v.is_empty()) {
        None
    } else {
        Some(row)
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl TabularReader for CsvParser {
    fn read(&self, path: &Path) -> ImportResult<Vec<Row>> {
        ensure_exists(path)?;

        // 检查扩展名（无扩展名时按 CSV 处理）
        if let Some(ext) = extension_of(path) {
            if !CSV_EXTENSIONS.contains(&ext.as_str()) {
                return Err(ImportError::UnsupportedFormat(ext));
            }
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers = normalize_headers(reader.headers()?.iter());

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            if let Some(row) = build_row(&headers, record.iter()) {
                rows.push(row);
            }
        }

        debug!(path = %path.display(), rows = rows.len(), "CSV 解析完成");
        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// 读取第一个工作表
pub struct ExcelParser;

impl TabularReader for ExcelParser {
    fn read(&self, path: &Path) -> ImportResult<Vec<Row>> {
        ensure_exists(path)?;

        let ext = extension_of(path).unwrap_or_default();
        if !SHEET_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(path)?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("表格文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        let mut sheet_rows = range.rows();
        let headers = match sheet_rows.next() {
            Some(header_row) => normalize_headers(header_row.iter().map(|cell| cell.to_string())),
            // 空工作表：无表头即无数据行
            None => return Ok(Vec::new()),
        };

        let rows: Vec<Row> = sheet_rows
            .filter_map(|data_row| build_row(&headers, data_row.iter().map(|c| c.to_string())))
            .collect();

        debug!(path = %path.display(), sheet = %sheet_name, rows = rows.len(), "表格解析完成");
        Ok(rows)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl TabularReader for UniversalFileParser {
    fn read(&self, path: &Path) -> ImportResult<Vec<Row>> {
        let ext = extension_of(path).unwrap_or_default();

        if CSV_EXTENSIONS.contains(&ext.as_str()) {
            CsvParser.read(path)
        } else if SHEET_EXTENSIONS.contains(&ext.as_str()) {
            ExcelParser.read(path)
        } else {
            ensure_exists(path)?;
            Err(ImportError::UnsupportedFormat(ext))
        }
    }
}
