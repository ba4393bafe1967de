use log::{debug, warn};

use calamine::{open_workbook, DataType, Range, Reader, Xlsx};
use case_stats::RawCaseRecord;
use chrono::{Days, NaiveDate};
use snafu::prelude::*;

use crate::dash::config_reader::CaseSource;
use crate::dash::io_common::ColumnIndex;
use crate::dash::{
    DashResult, EmptyExcelSnafu, MissingWorksheetSnafu, OpeningExcelSnafu,
};

pub fn read_excel_cases(path: &str, source: &CaseSource) -> DashResult<Vec<RawCaseRecord>> {
    let wrange = get_range(path, source)?;

    let mut iter = wrange.rows();
    let header: Vec<String> = iter
        .next()
        .context(EmptyExcelSnafu { path })?
        .iter()
        .map(|c| cell_text(c).unwrap_or_default())
        .collect();
    debug!("read_excel_cases: header: {:?}", header);
    let index = ColumnIndex::from_header(&header, path)?;

    let mut res: Vec<RawCaseRecord> = Vec::new();
    for (idx, row) in iter.enumerate() {
        // Same numbering as in the spreadsheet: the header is row 1
        let lineno = idx + 2;
        debug!("read_excel_cases: lineno: {:?} row: {:?}", lineno, row);
        if let Some(rec) = index.read_record(lineno, |c| row.get(c).and_then(cell_text)) {
            res.push(rec);
        }
    }
    Ok(res)
}

fn get_range(path: &str, source: &CaseSource) -> DashResult<Range<DataType>> {
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;
    let wrange = match &source.excel_worksheet_name {
        Some(name) => workbook
            .worksheet_range(name)
            .context(MissingWorksheetSnafu { name, path })?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu { path })?
            .context(OpeningExcelSnafu { path })?,
    };
    Ok(wrange)
}

/// The text of a cell, as it would appear in a CSV export.
fn cell_text(cell: &DataType) -> Option<String> {
    match cell {
        DataType::String(s) => Some(s.clone()),
        DataType::Int(i) => Some(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 => Some(format!("{}", *f as i64)),
        DataType::Float(f) => Some(f.to_string()),
        DataType::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        DataType::DateTime(serial) => {
            excel_serial_date(*serial).map(|d| d.format("%d/%m/%Y").to_string())
        }
        DataType::Empty => None,
        DataType::Error(e) => {
            warn!("cell_text: error cell {:?}", e);
            None
        }
        #[allow(unreachable_patterns)]
        _ => None,
    }
}

// Excel counts days from 1899-12-30 (this absorbs its 1900 leap year bug for
// all dates after February 1900).
fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}
