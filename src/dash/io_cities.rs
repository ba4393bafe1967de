// Reading the coordinates of the cities.

use log::{debug, info, warn};

use case_stats::{Coordinates, LocationLookup};
use snafu::prelude::*;

use crate::dash::config_reader::LocationSource;
use crate::dash::io_common::{columns, find_column};
use crate::dash::{CsvLineParseSnafu, DashResult, MissingColumnSnafu, OpeningCsvSnafu};

/// Reads the lookup table. Rows without usable coordinates are left out, so
/// their city ends up without a position on the map.
pub fn read_location_lookup(path: &str, source: &LocationSource) -> DashResult<LocationLookup> {
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
    let column = |name: &str| {
        find_column(&header, name).context(MissingColumnSnafu { column: name, path })
    };
    let city_idx = column(columns::CITY)?;
    let lat_idx = column(columns::LATITUDE)?;
    let long_idx = column(columns::LONGITUDE)?;

    let mut lookup = LocationLookup::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let city = match line.get(city_idx).map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => continue,
        };
        let coordinate = |i: usize| line.get(i).and_then(|s| s.trim().parse::<f64>().ok());
        match (coordinate(lat_idx), coordinate(long_idx)) {
            (Some(latitude), Some(longitude)) => {
                debug!(
                    "read_location_lookup: {:?} at ({}, {})",
                    city, latitude, longitude
                );
                lookup.insert(
                    city,
                    Coordinates {
                        latitude,
                        longitude,
                    },
                );
            }
            _ => warn!(
                "{}: line {}: no usable coordinates for {:?}",
                path, lineno, city
            ),
        }
    }
    info!("Read the coordinates of {} places from {}", lookup.len(), path);
    Ok(lookup)
}
