use log::{debug, info, warn};

use case_stats::builder::Builder;
use case_stats::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::dash::config_reader::*;

pub mod config_reader;
mod io_cities;
mod io_common;
mod io_csv;
mod io_excel;
mod summary;

#[derive(Debug, Snafu)]
pub enum DashError {
    #[snafu(display("Error opening file {path}"))]
    OpeningCsv { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Missing column {column:?} in {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("No worksheet named {name:?} in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display("The workbook {path} has no rows"))]
    EmptyExcel { path: String },
    #[snafu(display("Error reading file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Aggregation failed"))]
    Aggregation { source: AggregationError },
    #[snafu(display("The tables differ from the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type DashResult<T> = Result<T, DashError>;

fn read_case_data(source: &CaseSource) -> DashResult<Vec<RawCaseRecord>> {
    info!(
        "Attempting to read case file {:?} ({})",
        source.file_path, source.provider
    );
    let records = match source.provider.as_str() {
        "csv" => io_csv::read_csv_cases(&source.file_path, source)?,
        "xlsx" | "excel" => io_excel::read_excel_cases(&source.file_path, source)?,
        x => whatever!("Provider not implemented {:?}", x),
    };
    info!(
        "Read {} records from {:?}",
        records.len(),
        source.file_path
    );
    Ok(records)
}

// The provider of a file given on the command line, when it is not specified.
fn guess_provider(path: &str) -> String {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());
    match ext.as_deref() {
        Some("xlsx") | Some("xls") => "xlsx".to_string(),
        _ => "csv".to_string(),
    }
}

/// Combines the configuration file (if any) with the command line flags.
/// The flags take precedence.
fn assemble_config(args: &Args) -> DashResult<DashConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => DashConfig::default(),
    };

    if let Some(input) = &args.input {
        let provider = args
            .input_type
            .clone()
            .unwrap_or_else(|| guess_provider(input));
        config.case_sources = vec![CaseSource {
            provider,
            file_path: input.clone(),
            delimiter: args.delimiter.map(|c| c.to_string()),
            excel_worksheet_name: None,
        }];
    } else if let Some(delim) = args.delimiter {
        for source in config.case_sources.iter_mut() {
            source.delimiter = Some(delim.to_string());
        }
    }

    if let Some(cities) = &args.cities {
        config.location_source = Some(LocationSource {
            file_path: cities.clone(),
            delimiter: None,
        });
    }

    if args.skip_bad_dates {
        config.rules.on_malformed_date = Some("skipRecord".to_string());
    }

    if config.case_sources.is_empty() {
        whatever!("No case data: pass a file with --input or list caseSources in --config");
    }
    Ok(config)
}

/// Where the JSON document goes. None means the standard output.
fn output_destination(args: &Args, config: &DashConfig) -> DashResult<Option<String>> {
    match args.out.as_deref() {
        Some("stdout") | Some("") => Ok(None),
        Some(path) => Ok(Some(path.to_string())),
        None => match &config.output_settings.output_directory {
            Some(dir) => {
                fs::create_dir_all(dir).context(WritingOutputSnafu { path: dir.clone() })?;
                let p = Path::new(dir).join("dashboard_tables.json");
                Ok(Some(p.display().to_string()))
            }
            None => Ok(None),
        },
    }
}

/// Reads the sources, runs the aggregation and writes the tables.
///
/// Returns the JSON document that was produced.
pub fn run_dashboard(args: &Args) -> DashResult<JSValue> {
    let config = assemble_config(args)?;
    info!("config: {:?}", config);

    let rules = config.rules.to_rules()?;

    let mut data: Vec<RawCaseRecord> = Vec::new();
    for source in config.case_sources.iter() {
        let mut file_data = read_case_data(source)?;
        data.append(&mut file_data);
    }

    let lookup = match &config.location_source {
        Some(ls) => io_cities::read_location_lookup(&ls.file_path, ls)?,
        None => {
            warn!("No location lookup was given: no city can be placed on the map");
            LocationLookup::new()
        }
    };

    let mut builder = Builder::new(&rules).locations(lookup);
    for raw in data.iter() {
        builder.add_raw_record(raw).context(AggregationSnafu {})?;
    }
    debug!("run_dashboard: {} records kept", builder.len());
    let tables = builder.build().context(AggregationSnafu {})?;

    let result_js = summary::build_summary_js(&config.output_settings, &tables);
    let pretty_js = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    match output_destination(args, &config)? {
        Some(path) => {
            fs::write(&path, &pretty_js).context(WritingOutputSnafu { path: path.clone() })?;
            info!("Tables written to {}", path);
            println!("{}", summary::headline(&config.output_settings, &tables));
        }
        None => println!("{}", pretty_js),
    }

    // The reference tables, if provided for comparison
    if let Some(reference_p) = &args.reference {
        let reference = read_summary(reference_p)?;
        let pretty_reference =
            serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
        if pretty_reference != pretty_js {
            warn!("Found differences with the reference tables");
            print_diff(pretty_reference.as_str(), pretty_js.as_str(), "\n");
            return ReferenceMismatchSnafu {
                path: reference_p.clone(),
            }
            .fail();
        }
        info!("The tables match the reference {}", reference_p);
    }

    Ok(result_js)
}
