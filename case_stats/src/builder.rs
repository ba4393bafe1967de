use log::debug;

pub use crate::config::*;

/// A builder for collecting the records of one load.
///
/// It checks the dates as the records come in, following the rules it was
/// created with.
///
/// ```
/// pub use case_stats::builder::Builder;
/// pub use case_stats::{AggregationRules, StatusCounts};
/// # use case_stats::AggregationError;
///
/// let mut builder = Builder::new(&AggregationRules::default());
///
/// builder.add_simple("02/03/2020", StatusCounts { positive: 1, ..StatusCounts::EMPTY })?;
/// builder.add_simple(
///     "03/03/2020",
///     StatusCounts { positive: 2, recovered: 1, ..StatusCounts::EMPTY },
/// )?;
///
/// let tables = builder.build()?;
/// assert_eq!(tables.summary.currently_sick, Some(2));
/// assert_eq!(tables.summary.recovery_pct, Some(33.3));
///
/// # Ok::<(), AggregationError>(())
/// ```
pub struct Builder {
    pub(crate) rules: AggregationRules,
    pub(crate) lookup: LocationLookup,
    pub(crate) records: Vec<CaseRecord>,
    // Rows handed to add_simple so far, dropped ones included.
    pub(crate) simple_rows: usize,
}

impl Builder {
    pub fn new(rules: &AggregationRules) -> Builder {
        Builder {
            rules: rules.clone(),
            lookup: LocationLookup::new(),
            records: Vec::new(),
            simple_rows: 0,
        }
    }

    /// Sets the coordinates used to place the cities.
    pub fn locations(self, lookup: LocationLookup) -> Builder {
        Builder {
            rules: self.rules,
            lookup,
            records: self.records,
            simple_rows: self.simple_rows,
        }
    }

    /// Adds a record whose date is already known.
    pub fn add_record(&mut self, record: CaseRecord) {
        self.records.push(record);
    }

    /// Adds a record as read from a file.
    ///
    /// Fails if the date cannot be read and the rules say to abort. If the rules
    /// say to skip, the record is dropped and this returns `Ok`.
    pub fn add_raw_record(&mut self, raw: &RawCaseRecord) -> Result<(), AggregationError> {
        match crate::check_record(raw, &self.rules)? {
            Some(rec) => self.records.push(rec),
            None => debug!("add_raw_record: dropped record {}", raw.row),
        }
        Ok(())
    }

    /// Adds a record that only has a date and some counts.
    ///
    /// It is the simplest use case for most cases.
    pub fn add_simple(&mut self, date: &str, counts: StatusCounts) -> Result<(), AggregationError> {
        self.simple_rows += 1;
        let row = self.simple_rows;
        self.add_raw_record(&RawCaseRecord {
            row,
            date: date.to_string(),
            counts,
            city: None,
            age: None,
            sex: None,
            residency: None,
            import_factor: None,
            source_country: None,
            hospitalization_days: None,
        })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn build(&self) -> Result<DerivedTables, AggregationError> {
        crate::aggregate(&self.records, &self.lookup, &self.rules)
    }
}
