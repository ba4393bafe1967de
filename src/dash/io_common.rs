// Primitives shared by the readers of case records.

use log::{debug, warn};

use case_stats::{ImportFactor, RawCaseRecord, Residency, Sex, StatusCounts};
use snafu::prelude::*;

use crate::dash::{DashResult, MissingColumnSnafu};

// Column names of the case files.
pub mod columns {
    pub const DATE: &str = "Date";
    pub const POSITIVE: &str = "Positif";
    pub const NEGATIVE: &str = "Negatif";
    pub const DECEASED: &str = "Décédé";
    pub const RECOVERED: &str = "Guéri";
    pub const CITY: &str = "Ville";
    pub const AGE: &str = "Age";
    pub const MALE: &str = "Homme";
    pub const FEMALE: &str = "Femme";
    pub const RESIDENT: &str = "Resident Senegal";
    pub const IMPORT_FACTOR: &str = "Facteur";
    pub const SOURCE_COUNTRY: &str = "Source/Voyage";
    pub const HOSPITALIZATION_DAYS: &str = "Temps Hospitalisation (j)";

    pub const LATITUDE: &str = "Latitude";
    pub const LONGITUDE: &str = "Longitude";
}

/// Finds a column by name. Case and surrounding whitespace are ignored.
pub fn find_column<S: AsRef<str>>(header: &[S], name: &str) -> Option<usize> {
    let target = name.to_lowercase();
    header.iter().position(|h| {
        // Some exports start with a byte order mark
        h.as_ref().trim_start_matches('\u{feff}').trim().to_lowercase() == target
    })
}

/// The position of each known column in a case file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnIndex {
    date: usize,
    positive: Option<usize>,
    negative: Option<usize>,
    deceased: Option<usize>,
    recovered: Option<usize>,
    city: Option<usize>,
    age: Option<usize>,
    male: Option<usize>,
    female: Option<usize>,
    resident: Option<usize>,
    import_factor: Option<usize>,
    source_country: Option<usize>,
    hospitalization_days: Option<usize>,
}

impl ColumnIndex {
    pub fn from_header<S: AsRef<str>>(header: &[S], path: &str) -> DashResult<ColumnIndex> {
        let date = find_column(header, columns::DATE).context(MissingColumnSnafu {
            column: columns::DATE,
            path,
        })?;
        let optional = |name: &str| {
            let idx = find_column(header, name);
            if idx.is_none() {
                warn!("{}: no column {:?}, all its values are missing", path, name);
            }
            idx
        };
        let res = ColumnIndex {
            date,
            positive: optional(columns::POSITIVE),
            negative: optional(columns::NEGATIVE),
            deceased: optional(columns::DECEASED),
            recovered: optional(columns::RECOVERED),
            city: optional(columns::CITY),
            age: optional(columns::AGE),
            male: optional(columns::MALE),
            female: optional(columns::FEMALE),
            resident: optional(columns::RESIDENT),
            import_factor: optional(columns::IMPORT_FACTOR),
            source_country: optional(columns::SOURCE_COUNTRY),
            hospitalization_days: optional(columns::HOSPITALIZATION_DAYS),
        };
        debug!("ColumnIndex::from_header: {:?}", res);
        Ok(res)
    }

    /// Assembles a record from one row.
    ///
    /// `cell` returns the text of a column, or None if it is empty.
    /// Returns None for a row where every known column is empty.
    pub fn read_record<F>(&self, row: usize, cell: F) -> Option<RawCaseRecord>
    where
        F: Fn(usize) -> Option<String>,
    {
        let get = |idx: Option<usize>| -> Option<String> {
            idx.and_then(&cell)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let date = get(Some(self.date));
        let counts = StatusCounts {
            positive: parse_count(get(self.positive), row, columns::POSITIVE),
            negative: parse_count(get(self.negative), row, columns::NEGATIVE),
            deceased: parse_count(get(self.deceased), row, columns::DECEASED),
            recovered: parse_count(get(self.recovered), row, columns::RECOVERED),
        };
        let city = get(self.city);
        let age = parse_measure(get(self.age), row, columns::AGE);
        let sex = parse_sex(get(self.male), get(self.female), row);
        let residency = parse_residency(get(self.resident), row);
        let import_factor = parse_import_factor(get(self.import_factor), row);
        let source_country = get(self.source_country);
        let hospitalization_days = parse_measure(
            get(self.hospitalization_days),
            row,
            columns::HOSPITALIZATION_DAYS,
        );

        let blank = date.is_none()
            && counts == StatusCounts::EMPTY
            && city.is_none()
            && age.is_none()
            && sex.is_none()
            && residency.is_none()
            && import_factor.is_none()
            && source_country.is_none()
            && hospitalization_days.is_none();
        if blank {
            debug!("read_record: row {}: blank row", row);
            return None;
        }

        Some(RawCaseRecord {
            row,
            date: date.unwrap_or_default(),
            counts,
            city,
            age,
            sex,
            residency,
            import_factor,
            source_country,
            hospitalization_days,
        })
    }
}

fn parse_number(s: &str) -> Option<f64> {
    // Decimal commas show up in some exports
    s.replace(',', ".").parse::<f64>().ok().filter(|x| x.is_finite())
}

/// An empty cell is a zero count. A value that is not a non-negative whole
/// number is treated as missing.
pub fn parse_count(cell: Option<String>, row: usize, column: &str) -> u64 {
    match cell {
        None => 0,
        Some(s) => match parse_number(&s) {
            Some(x) if x >= 0.0 && x.fract() == 0.0 => x as u64,
            _ => {
                warn!(
                    "row {}: ignoring count {:?} in column {:?}",
                    row, s, column
                );
                0
            }
        },
    }
}

pub fn parse_measure(cell: Option<String>, row: usize, column: &str) -> Option<f64> {
    let s = cell?;
    match parse_number(&s) {
        Some(x) if x >= 0.0 => Some(x),
        _ => {
            warn!(
                "row {}: ignoring value {:?} in column {:?}",
                row, s, column
            );
            None
        }
    }
}

fn parse_flag(cell: Option<String>) -> Option<bool> {
    let s = cell?;
    match s.to_lowercase().as_str() {
        "1" | "1.0" | "oui" | "yes" | "true" | "x" => Some(true),
        "0" | "0.0" | "non" | "no" | "false" => Some(false),
        _ => None,
    }
}

/// The sex is spread over two indicator columns.
pub fn parse_sex(male: Option<String>, female: Option<String>, row: usize) -> Option<Sex> {
    match (parse_flag(male), parse_flag(female)) {
        (Some(true), Some(true)) => {
            warn!("row {}: both sexes are marked, ignoring", row);
            None
        }
        (Some(true), _) => Some(Sex::Male),
        (_, Some(true)) => Some(Sex::Female),
        _ => None,
    }
}

pub fn parse_residency(cell: Option<String>, row: usize) -> Option<Residency> {
    let s = cell?;
    match parse_flag(Some(s.clone())) {
        Some(true) => Some(Residency::Resident),
        Some(false) => Some(Residency::NonResident),
        None => {
            warn!("row {}: unknown residency {:?}", row, s);
            None
        }
    }
}

pub fn parse_import_factor(cell: Option<String>, row: usize) -> Option<ImportFactor> {
    let s = cell?;
    match s.to_lowercase().as_str() {
        "importé" | "importe" | "imported" => Some(ImportFactor::Imported),
        "contact" => Some(ImportFactor::Contact),
        "communauté" | "communaute" | "community" => Some(ImportFactor::Community),
        _ => {
            warn!("row {}: unknown import factor {:?}", row, s);
            None
        }
    }
}
