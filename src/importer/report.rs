// ==========================================
// 表格数据导入系统 - 结果汇总
// ==========================================
// 任一集合非空即 failure；两类明细原样透出，不聚合不截断
// ==========================================

use crate::domain::{ImportOutcome, ImportReport, ImportStatus};

pub struct ResultReporter;

impl ResultReporter {
    pub fn report(outcome: ImportOutcome) -> ImportReport {
        let imported = outcome.imported();
        let total_rows = outcome.total_rows;

        if outcome.has_problems() {
            ImportReport {
                result: ImportStatus::Failure,
                errors: Some(outcome.errors),
                failures: Some(outcome.failures),
                imported,
                total_rows,
            }
        } else {
            ImportReport {
                result: ImportStatus::Success,
                errors: None,
                failures: None,
                imported,
                total_rows,
            }
        }
    }
}
