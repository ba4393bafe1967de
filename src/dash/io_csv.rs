// Primitives for reading CSV files.

use log::debug;

use case_stats::RawCaseRecord;
use snafu::prelude::*;

use crate::dash::config_reader::CaseSource;
use crate::dash::io_common::ColumnIndex;
use crate::dash::{CsvLineParseSnafu, DashResult, OpeningCsvSnafu};

pub fn read_csv_cases(path: &str, source: &CaseSource) -> DashResult<Vec<RawCaseRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(source.delimiter_byte()?)
        .flexible(true)
        .from_path(path)
        .context(OpeningCsvSnafu { path })?;

    let header: Vec<String> = rdr
        .headers()
        .context(CsvLineParseSnafu { path, lineno: 1usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    debug!("read_csv_cases: header: {:?}", header);
    let index = ColumnIndex::from_header(&header, path)?;

    let mut res: Vec<RawCaseRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is the first line
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        debug!("read_csv_cases: lineno: {:?} row: {:?}", lineno, line);
        if let Some(rec) = index.read_record(lineno, |c| line.get(c).map(|s| s.to_string())) {
            res.push(rec);
        }
    }
    Ok(res)
}
