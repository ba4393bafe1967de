/*!
Aggregation of line-level COVID-19 case records into the series and figures of
a dashboard.

The entry point is [aggregate]: it takes all the records of one load, a
[LocationLookup] and the [AggregationRules], and returns the [DerivedTables].
It does not keep any state between calls. The [builder::Builder] offers the
same thing for records that still carry their raw date text.

See the [manual] for the meaning of each table.
*/

mod config;
use log::{debug, info, warn};

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

pub mod builder;
pub mod manual;

pub use crate::config::*;

/// Reads a date with the first of the given chrono formats that accepts it.
///
/// Years must have four digits: chrono reads `02/03/20` with `%Y` as the year
/// 20, so such dates are rejected.
pub fn parse_date(value: &str, formats: &[String]) -> Option<NaiveDate> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    formats
        .iter()
        .find_map(|fmt| {
            NaiveDate::parse_from_str(v, fmt.as_str())
                .ok()
                .filter(|d| d.year() >= 1000)
        })
}

// Applies the malformed date policy to one raw record.
// Ok(None) means the record is dropped.
pub(crate) fn check_record(
    raw: &RawCaseRecord,
    rules: &AggregationRules,
) -> Result<Option<CaseRecord>, AggregationError> {
    match parse_date(&raw.date, &rules.date_formats) {
        Some(date) => Ok(Some(raw.with_date(date))),
        None => match rules.malformed_date_policy {
            MalformedDatePolicy::Abort => Err(AggregationError::MalformedDate {
                row: raw.row,
                value: raw.date.clone(),
            }),
            MalformedDatePolicy::SkipRecord => {
                warn!(
                    "check_record: record {}: skipping unreadable date {:?}",
                    raw.row, raw.date
                );
                Ok(None)
            }
        },
    }
}

/// Validates the dates of all the raw records.
///
/// Under [MalformedDatePolicy::Abort], the first unreadable date fails the whole
/// collection.
pub fn validate_records(
    raw: &[RawCaseRecord],
    rules: &AggregationRules,
) -> Result<Vec<CaseRecord>, AggregationError> {
    let mut res: Vec<CaseRecord> = Vec::with_capacity(raw.len());
    for r in raw.iter() {
        if let Some(rec) = check_record(r, rules)? {
            res.push(rec);
        }
    }
    debug!(
        "validate_records: {} raw records, {} kept",
        raw.len(),
        res.len()
    );
    Ok(res)
}

/// Runs the whole aggregation over one snapshot of the data.
///
/// Arguments:
/// * `records` all the case records of this load, in source order
/// * `lookup` the coordinates of the known places
/// * `rules` the rounding and error policies
pub fn aggregate(
    records: &[CaseRecord],
    lookup: &LocationLookup,
    rules: &AggregationRules,
) -> Result<DerivedTables, AggregationError> {
    info!(
        "Aggregating {:?} records, {:?} known places, rules: {:?}",
        records.len(),
        lookup.len(),
        rules
    );

    let daily_totals = cumulative_daily_totals(records, rules.fill_missing_dates);
    let active = active_series(&daily_totals);
    let growth = growth_series(&daily_totals, rules.growth_window, rules.growth_decimals);
    let summary = summarize(&daily_totals, rules);
    let locations = location_totals(records, lookup, rules.unknown_location_policy)?;
    let breakdowns = category_breakdowns(records);
    let import_factor_timeline = import_factor_timeline(records);
    let averages = population_averages(records);

    info!(
        "Aggregated {} dates, {} places ({} without coordinates)",
        daily_totals.len(),
        locations.len(),
        locations.iter().filter(|l| !l.is_mappable()).count()
    );

    Ok(DerivedTables {
        daily_totals,
        active,
        growth,
        summary,
        locations,
        breakdowns,
        import_factor_timeline,
        averages,
    })
}

/// Sums the counts per date, then accumulates them in chronological order.
pub fn cumulative_daily_totals(
    records: &[CaseRecord],
    fill_missing_dates: bool,
) -> Vec<DailyTotals> {
    let mut per_date: BTreeMap<NaiveDate, StatusCounts> = BTreeMap::new();
    for r in records.iter() {
        *per_date.entry(r.date).or_default() += r.counts;
    }

    let dates: Vec<NaiveDate> = match (per_date.keys().next(), per_date.keys().next_back()) {
        (Some(first), Some(last)) if fill_missing_dates => {
            let mut days = vec![*first];
            let mut cur = *first;
            while cur < *last {
                match cur.succ_opt() {
                    Some(next) => {
                        days.push(next);
                        cur = next;
                    }
                    None => break,
                }
            }
            days
        }
        _ => per_date.keys().cloned().collect(),
    };

    let mut running = StatusCounts::EMPTY;
    let mut res: Vec<DailyTotals> = Vec::with_capacity(dates.len());
    for date in dates {
        if let Some(day) = per_date.get(&date) {
            running += *day;
        }
        res.push(DailyTotals {
            date,
            positive: running.positive,
            negative: running.negative,
            deceased: running.deceased,
            recovered: running.recovered,
        });
    }
    res
}

pub fn active_series(daily_totals: &[DailyTotals]) -> Vec<ActivePoint> {
    daily_totals
        .iter()
        .map(|dt| ActivePoint {
            date: dt.date,
            active: dt.active(),
        })
        .collect()
}

/// The daily growth rate of the cumulative positives, smoothed over `window` rows:
/// `sqrt(positive[t] / positive[t - window]) - 1`, in percent.
///
/// The first `window` rows have no lagged value, and a lagged value of zero
/// cannot be divided by. Both are reported as `None`.
pub fn growth_series(
    daily_totals: &[DailyTotals],
    window: usize,
    decimals: u32,
) -> Vec<GrowthPoint> {
    daily_totals
        .iter()
        .enumerate()
        .map(|(idx, dt)| GrowthPoint {
            date: dt.date,
            rate_pct: growth_rate(daily_totals, idx, window).map(|r| round_to(r, decimals)),
        })
        .collect()
}

// Unrounded growth rate of row `idx`, in percent.
fn growth_rate(daily_totals: &[DailyTotals], idx: usize, window: usize) -> Option<f64> {
    if idx < window || idx >= daily_totals.len() {
        return None;
    }
    let previous = daily_totals[idx - window].positive;
    if previous == 0 {
        return None;
    }
    let ratio = daily_totals[idx].positive as f64 / previous as f64;
    Some((ratio.sqrt() - 1.0) * 100.0)
}

/// The headline figures. The growth rate is rounded like the other headline
/// percentages, from the unrounded value.
pub fn summarize(daily_totals: &[DailyTotals], rules: &AggregationRules) -> Summary {
    let last = match daily_totals.last() {
        Some(x) => x,
        None => return Summary::default(),
    };
    let total_tests = last.positive.saturating_add(last.negative);
    Summary {
        as_of: Some(last.date),
        total_confirmed: Some(last.positive),
        total_negative: Some(last.negative),
        total_deaths: Some(last.deceased),
        total_recovered: Some(last.recovered),
        currently_sick: Some(last.active()),
        recovery_pct: percentage(last.recovered, last.positive, rules.percentage_decimals),
        total_tests: Some(total_tests),
        positive_test_pct: percentage(last.positive, total_tests, rules.percentage_decimals),
        growth_rate_pct: growth_rate(daily_totals, daily_totals.len() - 1, rules.growth_window)
            .map(|r| round_to(r, rules.percentage_decimals)),
    }
}

/// Positive cases per city, with the coordinates of the city when they are known.
///
/// Records without a city are not counted. The result is sorted by city name.
pub fn location_totals(
    records: &[CaseRecord],
    lookup: &LocationLookup,
    policy: UnknownLocationPolicy,
) -> Result<Vec<LocationTotal>, AggregationError> {
    let mut per_city: BTreeMap<String, u64> = BTreeMap::new();
    for r in records.iter() {
        if let Some(city) = clean_label(&r.city) {
            let total = per_city.entry(city).or_insert(0);
            *total = total.saturating_add(r.counts.positive);
        }
    }

    let mut res: Vec<LocationTotal> = Vec::with_capacity(per_city.len());
    for (city, positive) in per_city {
        let coordinates = lookup.get(&city);
        if coordinates.is_none() {
            match policy {
                UnknownLocationPolicy::NullCoordinate => {
                    warn!("location_totals: no coordinates for {:?}", city);
                }
                UnknownLocationPolicy::Abort => {
                    return Err(AggregationError::UnknownLocation { city });
                }
            }
        }
        res.push(LocationTotal {
            city,
            positive,
            coordinates,
        });
    }
    Ok(res)
}

pub fn category_breakdowns(records: &[CaseRecord]) -> Breakdowns {
    Breakdowns {
        import_factor: frequencies(records, |r| r.import_factor),
        city: frequencies(records, |r| clean_label(&r.city)),
        age: frequencies(records, |r| valid_measure(r.age).map(|a| a.floor() as u32)),
        sex: frequencies(records, |r| r.sex),
        residency: frequencies(records, |r| r.residency),
        source_country: frequencies(records, |r| clean_label(&r.source_country)),
    }
}

/// The cumulative count of each import factor, following the records in date
/// order. Records with the same date keep their source order.
pub fn import_factor_timeline(records: &[CaseRecord]) -> Vec<ImportFactorPoint> {
    let mut with_factor: Vec<(NaiveDate, ImportFactor)> = records
        .iter()
        .filter_map(|r| r.import_factor.map(|f| (r.date, f)))
        .collect();
    with_factor.sort_by_key(|p| p.0);

    let (mut imported, mut contact, mut community) = (0, 0, 0);
    with_factor
        .iter()
        .map(|(date, factor)| {
            match factor {
                ImportFactor::Imported => imported += 1,
                ImportFactor::Contact => contact += 1,
                ImportFactor::Community => community += 1,
            }
            ImportFactorPoint {
                date: *date,
                imported,
                contact,
                community,
            }
        })
        .collect()
}

pub fn population_averages(records: &[CaseRecord]) -> Averages {
    Averages {
        mean_age: mean(records.iter().filter_map(|r| valid_measure(r.age))),
        mean_hospitalization_days: mean(
            records
                .iter()
                .filter_map(|r| valid_measure(r.hospitalization_days)),
        ),
    }
}

fn frequencies<K, F>(records: &[CaseRecord], key: F) -> CategoryBreakdown<K>
where
    K: Ord,
    F: Fn(&CaseRecord) -> Option<K>,
{
    let mut counts: BTreeMap<K, u64> = BTreeMap::new();
    for r in records.iter() {
        if let Some(k) = key(r) {
            *counts.entry(k).or_insert(0) += 1;
        }
    }
    CategoryBreakdown {
        counts: counts.into_iter().collect(),
    }
}

// Blank labels count as missing.
fn clean_label(x: &Option<String>) -> Option<String> {
    x.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// Ages and durations are non-negative. Anything else is treated as missing.
fn valid_measure(x: Option<f64>) -> Option<f64> {
    x.filter(|v| v.is_finite() && *v >= 0.0)
}

fn mean<I: Iterator<Item = f64>>(values: I) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0u64), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

fn percentage(num: u64, den: u64, decimals: u32) -> Option<f64> {
    if den == 0 {
        None
    } else {
        Some(round_to(num as f64 / den as f64 * 100.0, decimals))
    }
}

fn round_to(x: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (x * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn positive(date: &str, positive: u64) -> CaseRecord {
        CaseRecord::new(
            d(date),
            StatusCounts {
                positive,
                ..StatusCounts::EMPTY
            },
        )
    }

    fn raw(row: usize, date: &str) -> RawCaseRecord {
        RawCaseRecord {
            row,
            date: date.to_string(),
            counts: StatusCounts {
                positive: 1,
                ..StatusCounts::EMPTY
            },
            city: None,
            age: None,
            sex: None,
            residency: None,
            import_factor: None,
            source_country: None,
            hospitalization_days: None,
        }
    }

    fn two_days() -> Vec<CaseRecord> {
        vec![
            positive("2020-03-02", 1),
            CaseRecord::new(
                d("2020-03-03"),
                StatusCounts {
                    positive: 2,
                    recovered: 1,
                    ..StatusCounts::EMPTY
                },
            ),
        ]
    }

    #[test]
    fn two_day_scenario() {
        init();
        let tables = aggregate(
            &two_days(),
            &LocationLookup::new(),
            &AggregationRules::default(),
        )
        .unwrap();
        let pos: Vec<u64> = tables.daily_totals.iter().map(|x| x.positive).collect();
        let rec: Vec<u64> = tables.daily_totals.iter().map(|x| x.recovered).collect();
        let act: Vec<i64> = tables.active.iter().map(|x| x.active).collect();
        assert_eq!(pos, vec![1, 3]);
        assert_eq!(rec, vec![0, 1]);
        assert_eq!(act, vec![1, 2]);
        assert_eq!(tables.summary.currently_sick, Some(2));
        assert_eq!(tables.summary.recovery_pct, Some(33.3));
        assert_eq!(tables.summary.total_confirmed, Some(3));
        assert_eq!(tables.summary.total_tests, Some(3));
        assert_eq!(tables.summary.positive_test_pct, Some(100.0));
        assert_eq!(tables.summary.as_of, Some(d("2020-03-03")));
    }

    #[test]
    fn empty_dataset() {
        let tables = aggregate(&[], &LocationLookup::new(), &AggregationRules::default()).unwrap();
        assert!(tables.daily_totals.is_empty());
        assert!(tables.active.is_empty());
        assert!(tables.growth.is_empty());
        assert!(tables.locations.is_empty());
        assert!(tables.import_factor_timeline.is_empty());
        assert_eq!(tables.summary, Summary::default());
        assert_eq!(tables.summary.recovery_pct, None);
        assert_eq!(tables.summary.total_confirmed, None);
        assert!(tables.breakdowns.import_factor.is_empty());
        assert!(tables.breakdowns.city.is_empty());
        assert!(tables.breakdowns.age.is_empty());
        assert!(tables.breakdowns.sex.is_empty());
        assert!(tables.breakdowns.residency.is_empty());
        assert_eq!(tables.averages, Averages::default());
    }

    #[test]
    fn unknown_city_keeps_count() {
        let mut lookup = LocationLookup::new();
        lookup.insert(
            "Dakar",
            Coordinates {
                latitude: 14.7,
                longitude: -17.4,
            },
        );
        let mut a = positive("2020-03-02", 2);
        a.city = Some("Foo".to_string());
        let mut b = positive("2020-03-03", 3);
        b.city = Some("Foo".to_string());
        let mut c = positive("2020-03-03", 1);
        c.city = Some("Dakar".to_string());
        let no_city = positive("2020-03-04", 7);

        let tables =
            aggregate(&[a, b, c, no_city], &lookup, &AggregationRules::default()).unwrap();
        assert_eq!(tables.locations.len(), 2);
        let dakar = &tables.locations[0];
        assert_eq!(dakar.city, "Dakar");
        assert_eq!(dakar.positive, 1);
        assert!(dakar.is_mappable());
        let foo = &tables.locations[1];
        assert_eq!(foo.city, "Foo");
        assert_eq!(foo.positive, 5);
        assert_eq!(foo.coordinates, None);
        assert!(!foo.is_mappable());
    }

    #[test]
    fn unknown_city_can_abort() {
        let mut a = positive("2020-03-02", 2);
        a.city = Some("Foo".to_string());
        let rules = AggregationRules {
            unknown_location_policy: UnknownLocationPolicy::Abort,
            ..AggregationRules::default()
        };
        let res = aggregate(&[a], &LocationLookup::new(), &rules);
        assert_eq!(
            res,
            Err(AggregationError::UnknownLocation {
                city: "Foo".to_string()
            })
        );
    }

    #[test]
    fn totals_are_monotonic_and_chronological() {
        // Out of order on purpose
        let mut records = vec![
            positive("2020-03-05", 4),
            positive("2020-03-02", 1),
            CaseRecord::new(
                d("2020-03-04"),
                StatusCounts {
                    negative: 10,
                    deceased: 1,
                    ..StatusCounts::EMPTY
                },
            ),
            positive("2020-03-02", 2),
        ];
        records.push(CaseRecord::new(
            d("2020-03-03"),
            StatusCounts {
                recovered: 2,
                ..StatusCounts::EMPTY
            },
        ));
        let totals = cumulative_daily_totals(&records, false);
        let dates: Vec<NaiveDate> = totals.iter().map(|x| x.date).collect();
        assert_eq!(
            dates,
            vec![
                d("2020-03-02"),
                d("2020-03-03"),
                d("2020-03-04"),
                d("2020-03-05")
            ]
        );
        for w in totals.windows(2) {
            assert!(w[0].date < w[1].date);
            assert!(w[0].positive <= w[1].positive);
            assert!(w[0].negative <= w[1].negative);
            assert!(w[0].deceased <= w[1].deceased);
            assert!(w[0].recovered <= w[1].recovered);
        }
        // Values carry forward on days without positives
        let pos: Vec<u64> = totals.iter().map(|x| x.positive).collect();
        assert_eq!(pos, vec![3, 3, 3, 7]);
        let active = active_series(&totals);
        for (t, a) in totals.iter().zip(active.iter()) {
            assert_eq!(a.active, t.positive as i64 - t.recovered as i64);
        }
    }

    #[test]
    fn active_is_not_clamped() {
        let records = vec![CaseRecord::new(
            d("2020-03-02"),
            StatusCounts {
                recovered: 2,
                ..StatusCounts::EMPTY
            },
        )];
        let tables =
            aggregate(&records, &LocationLookup::new(), &AggregationRules::default()).unwrap();
        assert_eq!(tables.active[0].active, -2);
        assert_eq!(tables.summary.currently_sick, Some(-2));
        // No positives: the recovery rate has no denominator.
        assert_eq!(tables.summary.recovery_pct, None);
        assert_eq!(tables.summary.positive_test_pct, None);
        assert_eq!(tables.summary.total_tests, Some(0));
    }

    #[test]
    fn fill_missing_dates_carries_totals() {
        let records = vec![positive("2020-03-02", 1), positive("2020-03-05", 2)];
        let totals = cumulative_daily_totals(&records, true);
        let pos: Vec<u64> = totals.iter().map(|x| x.positive).collect();
        assert_eq!(pos, vec![1, 1, 1, 3]);
        assert_eq!(totals[1].date, d("2020-03-03"));
        assert_eq!(cumulative_daily_totals(&records, false).len(), 2);
    }

    #[test]
    fn growth_needs_history() {
        let records = vec![
            positive("2020-03-02", 1),
            positive("2020-03-03", 2),
            positive("2020-03-04", 3),
        ];
        let totals = cumulative_daily_totals(&records, false);
        let growth = growth_series(&totals, 2, 2);
        assert_eq!(growth.len(), 3);
        assert_eq!(growth[0].rate_pct, None);
        assert_eq!(growth[1].rate_pct, None);
        // sqrt(6 / 1) - 1 = 1.44949
        assert_eq!(growth[2].rate_pct, Some(144.95));

        let short = growth_series(&totals[..2], 2, 2);
        assert!(short.iter().all(|g| g.rate_pct.is_none()));
    }

    #[test]
    fn growth_with_zero_lag_value_is_undefined() {
        let records = vec![
            CaseRecord::new(
                d("2020-03-01"),
                StatusCounts {
                    negative: 3,
                    ..StatusCounts::EMPTY
                },
            ),
            positive("2020-03-02", 1),
            positive("2020-03-03", 1),
            positive("2020-03-04", 2),
        ];
        let tables =
            aggregate(&records, &LocationLookup::new(), &AggregationRules::default()).unwrap();
        let rates: Vec<Option<f64>> = tables.growth.iter().map(|g| g.rate_pct).collect();
        // Lag value of zero on the third day; sqrt(4 / 1) - 1 on the fourth.
        assert_eq!(rates, vec![None, None, None, Some(100.0)]);
        assert_eq!(tables.summary.growth_rate_pct, Some(100.0));
    }

    #[test]
    fn percentages_stay_in_range() {
        let records = vec![CaseRecord::new(
            d("2020-03-02"),
            StatusCounts {
                positive: 7,
                negative: 93,
                recovered: 7,
                deceased: 0,
            },
        )];
        let tables =
            aggregate(&records, &LocationLookup::new(), &AggregationRules::default()).unwrap();
        assert_eq!(tables.summary.recovery_pct, Some(100.0));
        assert_eq!(tables.summary.positive_test_pct, Some(7.0));
        assert_eq!(tables.summary.total_tests, Some(100));
        for p in [tables.summary.recovery_pct, tables.summary.positive_test_pct] {
            let v = p.unwrap();
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn breakdowns_skip_missing_values() {
        let mut records: Vec<CaseRecord> = Vec::new();
        for (idx, factor) in [
            Some(ImportFactor::Imported),
            Some(ImportFactor::Contact),
            None,
            Some(ImportFactor::Contact),
            Some(ImportFactor::Community),
        ]
        .iter()
        .enumerate()
        {
            let mut r = positive("2020-03-02", 1);
            r.import_factor = *factor;
            r.age = if idx % 2 == 0 {
                Some(30.0 + idx as f64 + 0.5)
            } else {
                None
            };
            r.sex = match idx {
                0 | 1 => Some(Sex::Male),
                2 => Some(Sex::Female),
                _ => None,
            };
            r.residency = if idx == 4 {
                Some(Residency::NonResident)
            } else {
                Some(Residency::Resident)
            };
            r.city = if idx == 3 {
                Some("  ".to_string())
            } else {
                Some("Dakar".to_string())
            };
            records.push(r);
        }
        let b = category_breakdowns(&records);
        assert_eq!(b.import_factor.total(), 4);
        assert_eq!(b.import_factor.get(&ImportFactor::Contact), Some(2));
        assert_eq!(b.import_factor.get(&ImportFactor::Imported), Some(1));
        assert_eq!(b.age.total(), 3);
        assert_eq!(b.age.counts, vec![(30, 1), (32, 1), (34, 1)]);
        assert_eq!(b.sex.total(), 3);
        assert_eq!(b.sex.get(&Sex::Male), Some(2));
        assert_eq!(b.residency.total(), 5);
        assert_eq!(b.residency.get(&Residency::NonResident), Some(1));
        // The blank city is missing
        assert_eq!(b.city.counts, vec![("Dakar".to_string(), 4)]);
        assert!(b.source_country.is_empty());
    }

    #[test]
    fn import_factor_timeline_is_cumulative() {
        let mut a = positive("2020-03-04", 1);
        a.import_factor = Some(ImportFactor::Contact);
        let mut b = positive("2020-03-02", 1);
        b.import_factor = Some(ImportFactor::Imported);
        let c = positive("2020-03-03", 1);
        let mut e = positive("2020-03-04", 1);
        e.import_factor = Some(ImportFactor::Community);
        let mut f = positive("2020-03-02", 1);
        f.import_factor = Some(ImportFactor::Imported);

        let timeline = import_factor_timeline(&[a, b, c, e, f]);
        assert_eq!(timeline.len(), 4);
        let last = timeline.last().unwrap();
        assert_eq!((last.imported, last.contact, last.community), (2, 1, 1));
        assert_eq!(timeline[0].date, d("2020-03-02"));
        assert_eq!((timeline[1].imported, timeline[1].contact), (2, 0));
        // Same date: source order is kept.
        assert_eq!((timeline[2].contact, timeline[2].community), (1, 0));
        for w in timeline.windows(2) {
            assert!(w[0].date <= w[1].date);
        }
    }

    #[test]
    fn averages_ignore_missing_and_negative() {
        let mut a = positive("2020-03-02", 1);
        a.age = Some(40.0);
        a.hospitalization_days = Some(10.0);
        let mut b = positive("2020-03-02", 1);
        b.age = Some(20.0);
        b.hospitalization_days = Some(-1.0);
        let c = positive("2020-03-02", 1);
        let avg = population_averages(&[a, b, c]);
        assert_eq!(avg.mean_age, Some(30.0));
        assert_eq!(avg.mean_hospitalization_days, Some(10.0));
    }

    #[test]
    fn malformed_date_aborts_by_default() {
        let res = validate_records(
            &[raw(1, "02/03/2020"), raw(2, "32/13/2020")],
            &AggregationRules::default(),
        );
        assert_eq!(
            res,
            Err(AggregationError::MalformedDate {
                row: 2,
                value: "32/13/2020".to_string()
            })
        );
    }

    #[test]
    fn malformed_date_can_be_skipped() {
        init();
        let rules = AggregationRules {
            malformed_date_policy: MalformedDatePolicy::SkipRecord,
            ..AggregationRules::default()
        };
        let raws = [raw(1, "02/03/2020"), raw(2, ""), raw(3, "2020-03-04")];
        let recs = validate_records(&raws, &rules).unwrap();
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].date, d("2020-03-02"));
        assert_eq!(recs[1].date, d("2020-03-04"));
    }

    #[test]
    fn dates_are_day_first() {
        let formats = AggregationRules::default().date_formats;
        assert_eq!(parse_date("02/04/2020", &formats), Some(d("2020-04-02")));
        assert_eq!(parse_date(" 2-4-2020 ", &formats), Some(d("2020-04-02")));
        assert_eq!(parse_date("2020-04-02", &formats), Some(d("2020-04-02")));
        assert_eq!(parse_date("yesterday", &formats), None);
        assert_eq!(parse_date("", &formats), None);
        // Two-digit years are not read as the first century
        assert_eq!(parse_date("02/03/20", &formats), None);
        assert_eq!(parse_date("2-3-20", &formats), None);
    }

    #[test]
    fn two_digit_year_is_a_malformed_date() {
        let raws = [raw(1, "02/03/2020"), raw(2, "02/03/20")];
        let res = validate_records(&raws, &AggregationRules::default());
        assert_eq!(
            res,
            Err(AggregationError::MalformedDate {
                row: 2,
                value: "02/03/20".to_string()
            })
        );
    }

    #[test]
    fn huge_counts_saturate() {
        let big = u64::MAX / 2 + 1;
        let records = vec![
            positive("2020-03-02", big),
            positive("2020-03-03", big),
            CaseRecord::new(
                d("2020-03-03"),
                StatusCounts {
                    negative: big,
                    ..StatusCounts::EMPTY
                },
            ),
        ];
        let tables =
            aggregate(&records, &LocationLookup::new(), &AggregationRules::default()).unwrap();
        let last = tables.daily_totals.last().unwrap();
        assert_eq!(last.positive, u64::MAX);
        assert_eq!(last.negative, big);
        assert_eq!(tables.summary.total_tests, Some(u64::MAX));
        assert_eq!(tables.summary.currently_sick, Some(i64::MAX));
        assert_eq!(tables.active[0].active, i64::MAX);

        let totals = DailyTotals {
            date: d("2020-03-02"),
            positive: 0,
            negative: 0,
            deceased: 0,
            recovered: u64::MAX,
        };
        assert_eq!(totals.active(), i64::MIN);
    }

    #[test]
    fn headline_growth_uses_percentage_precision() {
        let records = vec![
            positive("2020-03-02", 1),
            positive("2020-03-03", 1),
            positive("2020-03-04", 1),
        ];
        let tables =
            aggregate(&records, &LocationLookup::new(), &AggregationRules::default()).unwrap();
        // sqrt(3 / 1) - 1 = 0.73205
        assert_eq!(tables.growth[2].rate_pct, Some(73.21));
        assert_eq!(tables.summary.growth_rate_pct, Some(73.2));
    }
}
