// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

use chrono::NaiveDate;

/// The outcome counts reported on a single row.
///
/// A missing cell in the source is simply a zero here.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct StatusCounts {
    pub positive: u64,
    pub negative: u64,
    pub deceased: u64,
    pub recovered: u64,
}

impl StatusCounts {
    pub const EMPTY: StatusCounts = StatusCounts {
        positive: 0,
        negative: 0,
        deceased: 0,
        recovered: 0,
    };
}

// Totals saturate at u64::MAX instead of overflowing.
impl std::ops::AddAssign for StatusCounts {
    fn add_assign(&mut self, rhs: StatusCounts) {
        self.positive = self.positive.saturating_add(rhs.positive);
        self.negative = self.negative.saturating_add(rhs.negative);
        self.deceased = self.deceased.saturating_add(rhs.deceased);
        self.recovered = self.recovered.saturating_add(rhs.recovered);
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Sex {
    Male,
    Female,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Residency {
    Resident,
    NonResident,
}

/// How a case was contracted.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum ImportFactor {
    /// The patient travelled from abroad.
    Imported,
    /// The patient was in contact with a known case.
    Contact,
    /// No contact could be traced.
    Community,
}

/// A case record, after the date has been validated.
#[derive(PartialEq, Debug, Clone)]
pub struct CaseRecord {
    pub date: NaiveDate,
    pub counts: StatusCounts,
    pub city: Option<String>,
    pub age: Option<f64>,
    pub sex: Option<Sex>,
    pub residency: Option<Residency>,
    pub import_factor: Option<ImportFactor>,
    pub source_country: Option<String>,
    pub hospitalization_days: Option<f64>,
}

impl CaseRecord {
    /// A record with only a date and some counts. All the optional fields are missing.
    pub fn new(date: NaiveDate, counts: StatusCounts) -> CaseRecord {
        CaseRecord {
            date,
            counts,
            city: None,
            age: None,
            sex: None,
            residency: None,
            import_factor: None,
            source_country: None,
            hospitalization_days: None,
        }
    }
}

/// A case record as read by the input readers, before the date is checked.
///
/// `row` is the position of the record in its source and is only used for error reporting.
#[derive(PartialEq, Debug, Clone)]
pub struct RawCaseRecord {
    pub row: usize,
    pub date: String,
    pub counts: StatusCounts,
    pub city: Option<String>,
    pub age: Option<f64>,
    pub sex: Option<Sex>,
    pub residency: Option<Residency>,
    pub import_factor: Option<ImportFactor>,
    pub source_country: Option<String>,
    pub hospitalization_days: Option<f64>,
}

impl RawCaseRecord {
    pub(crate) fn with_date(&self, date: NaiveDate) -> CaseRecord {
        CaseRecord {
            date,
            counts: self.counts,
            city: self.city.clone(),
            age: self.age,
            sex: self.sex,
            residency: self.residency,
            import_factor: self.import_factor,
            source_country: self.source_country.clone(),
            hospitalization_days: self.hospitalization_days,
        }
    }
}

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// The static mapping between place names and their coordinates.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct LocationLookup {
    places: HashMap<String, Coordinates>,
}

impl LocationLookup {
    pub fn new() -> LocationLookup {
        LocationLookup {
            places: HashMap::new(),
        }
    }

    pub fn insert(&mut self, city: &str, coordinates: Coordinates) {
        self.places.insert(city.trim().to_string(), coordinates);
    }

    pub fn get(&self, city: &str) -> Option<Coordinates> {
        self.places.get(city.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

impl FromIterator<(String, Coordinates)> for LocationLookup {
    fn from_iter<I: IntoIterator<Item = (String, Coordinates)>>(iter: I) -> Self {
        let mut lookup = LocationLookup::new();
        for (city, coordinates) in iter {
            lookup.insert(&city, coordinates);
        }
        lookup
    }
}

// ******** Output data structures *********

/// Cumulative totals as of one date.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub positive: u64,
    pub negative: u64,
    pub deceased: u64,
    pub recovered: u64,
}

impl DailyTotals {
    /// Cumulative positive minus cumulative recovered. Not clamped at zero:
    /// inconsistent data shows up as a negative number. Saturates at the
    /// bounds of `i64`.
    pub fn active(&self) -> i64 {
        let diff = self.positive as i128 - self.recovered as i128;
        diff.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ActivePoint {
    pub date: NaiveDate,
    pub active: i64,
}

/// Smoothed daily growth, in percent. `None` when it cannot be computed yet.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct GrowthPoint {
    pub date: NaiveDate,
    pub rate_pct: Option<f64>,
}

/// Headline figures, read from the last row of the daily totals.
///
/// Every field is `None` for an empty dataset.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Summary {
    pub as_of: Option<NaiveDate>,
    pub total_confirmed: Option<u64>,
    pub total_negative: Option<u64>,
    pub total_deaths: Option<u64>,
    pub total_recovered: Option<u64>,
    pub currently_sick: Option<i64>,
    pub recovery_pct: Option<f64>,
    pub total_tests: Option<u64>,
    pub positive_test_pct: Option<f64>,
    pub growth_rate_pct: Option<f64>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct LocationTotal {
    pub city: String,
    pub positive: u64,
    /// Missing when the city is not in the lookup.
    pub coordinates: Option<Coordinates>,
}

impl LocationTotal {
    pub fn is_mappable(&self) -> bool {
        self.coordinates.is_some()
    }
}

/// Number of records per value of a categorical field. Records where the field
/// is missing are not counted. Entries are sorted by key.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CategoryBreakdown<K> {
    pub counts: Vec<(K, u64)>,
}

impl<K: PartialEq> CategoryBreakdown<K> {
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|(_, c)| *c).sum()
    }

    pub fn get(&self, key: &K) -> Option<u64> {
        self.counts.iter().find(|(k, _)| k == key).map(|(_, c)| *c)
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Running count of each import factor, one point per record that has one.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct ImportFactorPoint {
    pub date: NaiveDate,
    pub imported: u64,
    pub contact: u64,
    pub community: u64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct Breakdowns {
    pub import_factor: CategoryBreakdown<ImportFactor>,
    pub city: CategoryBreakdown<String>,
    /// Keyed by age in whole years.
    pub age: CategoryBreakdown<u32>,
    pub sex: CategoryBreakdown<Sex>,
    pub residency: CategoryBreakdown<Residency>,
    pub source_country: CategoryBreakdown<String>,
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct Averages {
    pub mean_age: Option<f64>,
    pub mean_hospitalization_days: Option<f64>,
}

/// Everything the presentation layer needs for one load of the dashboard.
#[derive(PartialEq, Debug, Clone)]
pub struct DerivedTables {
    pub daily_totals: Vec<DailyTotals>,
    pub active: Vec<ActivePoint>,
    pub growth: Vec<GrowthPoint>,
    pub summary: Summary,
    pub locations: Vec<LocationTotal>,
    pub breakdowns: Breakdowns,
    pub import_factor_timeline: Vec<ImportFactorPoint>,
    pub averages: Averages,
}

/// Errors that abort the aggregation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AggregationError {
    /// The date of a record could not be read with any of the accepted formats.
    MalformedDate { row: usize, value: String },
    /// A city is missing from the location lookup and the rules do not allow it.
    UnknownLocation { city: String },
}

impl Error for AggregationError {}

impl Display for AggregationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationError::MalformedDate { row, value } => {
                write!(f, "record {}: cannot read date {:?}", row, value)
            }
            AggregationError::UnknownLocation { city } => {
                write!(f, "city {:?} is not in the location lookup", city)
            }
        }
    }
}

// ********* Configuration **********

/// What to do with a record whose date cannot be read.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MalformedDatePolicy {
    /// The whole aggregation fails.
    Abort,
    /// The record is dropped with a warning.
    SkipRecord,
}

/// What to do with a city that is not in the location lookup.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum UnknownLocationPolicy {
    /// The city is kept with no coordinates.
    NullCoordinate,
    Abort,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AggregationRules {
    /// The lag, in rows of daily totals, of the smoothed growth rate.
    pub growth_window: usize,
    /// Decimal places for the headline percentages.
    pub percentage_decimals: u32,
    /// Decimal places for the growth rates.
    pub growth_decimals: u32,
    pub malformed_date_policy: MalformedDatePolicy,
    pub unknown_location_policy: UnknownLocationPolicy,
    /// If set, calendar days without any record are added to the daily totals.
    pub fill_missing_dates: bool,
    /// chrono formats tried in order on the raw dates.
    pub date_formats: Vec<String>,
}

pub const DEFAULT_DATE_FORMATS: [&str; 3] = ["%d/%m/%Y", "%d-%m-%Y", "%Y-%m-%d"];

impl Default for AggregationRules {
    fn default() -> Self {
        AggregationRules {
            growth_window: 2,
            percentage_decimals: 1,
            growth_decimals: 2,
            malformed_date_policy: MalformedDatePolicy::Abort,
            unknown_location_policy: UnknownLocationPolicy::NullCoordinate,
            fill_missing_dates: false,
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
        }
    }
}
