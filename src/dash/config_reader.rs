use crate::dash::*;

use snafu::prelude::*;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    #[serde(rename = "dashboardName")]
    pub dashboard_name: Option<String>,
    pub country: Option<String>,
    #[serde(rename = "lastUpdated")]
    pub last_updated: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct CaseSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub delimiter: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl CaseSource {
    pub fn delimiter_byte(&self) -> DashResult<u8> {
        delimiter_byte(&self.delimiter, b';')
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct LocationSource {
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub delimiter: Option<String>,
}

impl LocationSource {
    pub fn delimiter_byte(&self) -> DashResult<u8> {
        delimiter_byte(&self.delimiter, b',')
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashRules {
    #[serde(rename = "growthWindow")]
    pub growth_window: Option<usize>,
    #[serde(rename = "percentageDecimals")]
    pub percentage_decimals: Option<u32>,
    #[serde(rename = "growthDecimals")]
    pub growth_decimals: Option<u32>,
    #[serde(rename = "onMalformedDate")]
    pub on_malformed_date: Option<String>,
    #[serde(rename = "onUnknownLocation")]
    pub on_unknown_location: Option<String>,
    #[serde(rename = "fillMissingDates")]
    pub fill_missing_dates: Option<bool>,
    #[serde(rename = "dateFormats")]
    pub date_formats: Option<Vec<String>>,
}

impl DashRules {
    /// Checks the rules and fills in the defaults.
    pub fn to_rules(&self) -> DashResult<AggregationRules> {
        let defaults = AggregationRules::default();
        let res = AggregationRules {
            growth_window: match self.growth_window {
                Some(0) => whatever!("growthWindow must be at least 1 day"),
                Some(x) => x,
                None => defaults.growth_window,
            },
            percentage_decimals: self
                .percentage_decimals
                .unwrap_or(defaults.percentage_decimals),
            growth_decimals: self.growth_decimals.unwrap_or(defaults.growth_decimals),
            malformed_date_policy: match self.on_malformed_date.as_deref() {
                None | Some("abort") => MalformedDatePolicy::Abort,
                Some("skipRecord") => MalformedDatePolicy::SkipRecord,
                Some(x) => whatever!("unknown onMalformedDate option: {:?}", x),
            },
            unknown_location_policy: match self.on_unknown_location.as_deref() {
                None | Some("nullCoordinate") => UnknownLocationPolicy::NullCoordinate,
                Some("abort") => UnknownLocationPolicy::Abort,
                Some(x) => whatever!("unknown onUnknownLocation option: {:?}", x),
            },
            fill_missing_dates: self.fill_missing_dates.unwrap_or(false),
            date_formats: match &self.date_formats {
                Some(fmts) if fmts.is_empty() => whatever!("dateFormats cannot be empty"),
                Some(fmts) => fmts.clone(),
                None => defaults.date_formats,
            },
        };
        Ok(res)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "caseSources", default)]
    pub case_sources: Vec<CaseSource>,
    #[serde(rename = "locationSource")]
    pub location_source: Option<LocationSource>,
    #[serde(default)]
    pub rules: DashRules,
}

impl DashConfig {
    // The paths in a configuration file are relative to that file.
    fn resolve_paths(&mut self, root: &Path) {
        let resolve = |p: &String| -> String {
            if Path::new(p).is_absolute() {
                p.clone()
            } else {
                root.join(p).display().to_string()
            }
        };
        for source in self.case_sources.iter_mut() {
            source.file_path = resolve(&source.file_path);
        }
        if let Some(ls) = self.location_source.as_mut() {
            ls.file_path = resolve(&ls.file_path);
        }
        if let Some(dir) = self.output_settings.output_directory.as_mut() {
            *dir = resolve(dir);
        }
    }
}

pub fn read_config(path: &str) -> DashResult<DashConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let mut config: DashConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    let root = Path::new(path).parent().unwrap_or_else(|| Path::new(""));
    config.resolve_paths(root);
    Ok(config)
}

pub fn read_summary(path: &str) -> DashResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn delimiter_byte(delimiter: &Option<String>, default: u8) -> DashResult<u8> {
    match delimiter.as_deref() {
        None | Some("") => Ok(default),
        Some("\\t") | Some("\t") => Ok(b'\t'),
        Some(s) if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        Some(s) => whatever!("the delimiter must be a single ASCII character, got {:?}", s),
    }
}
