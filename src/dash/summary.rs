// The JSON document handed to the chart layer, and the headline text.

use std::fmt::Write;

use case_stats::*;
use serde_json::json;
use serde_json::Value as JSValue;

use crate::dash::config_reader::OutputSettings;

// Placeholder for the figures that cannot be computed.
const UNDEFINED: &str = "—";

fn import_factor_name(f: &ImportFactor) -> &'static str {
    match f {
        ImportFactor::Imported => "imported",
        ImportFactor::Contact => "contact",
        ImportFactor::Community => "community",
    }
}

fn sex_name(s: &Sex) -> &'static str {
    match s {
        Sex::Male => "male",
        Sex::Female => "female",
    }
}

fn residency_name(r: &Residency) -> &'static str {
    match r {
        Residency::Resident => "resident",
        Residency::NonResident => "nonResident",
    }
}

fn breakdown_to_json<K, F>(b: &CategoryBreakdown<K>, name: F) -> JSValue
where
    F: Fn(&K) -> JSValue,
{
    let l: Vec<JSValue> = b
        .counts
        .iter()
        .map(|(k, count)| json!({"value": name(k), "count": count}))
        .collect();
    JSValue::Array(l)
}

fn summary_to_json(s: &Summary) -> JSValue {
    json!({
        "totalConfirmed": s.total_confirmed,
        "totalNegative": s.total_negative,
        "totalDeaths": s.total_deaths,
        "totalRecovered": s.total_recovered,
        "currentlySick": s.currently_sick,
        "recoveryPct": s.recovery_pct,
        "totalTests": s.total_tests,
        "positiveTestPct": s.positive_test_pct,
        "growthRatePct": s.growth_rate_pct,
    })
}

fn date_str(d: &chrono::NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

pub fn build_summary_js(settings: &OutputSettings, tables: &DerivedTables) -> JSValue {
    let daily_totals: Vec<JSValue> = tables
        .daily_totals
        .iter()
        .map(|dt| {
            json!({
                "date": date_str(&dt.date),
                "positive": dt.positive,
                "negative": dt.negative,
                "deceased": dt.deceased,
                "recovered": dt.recovered,
            })
        })
        .collect();

    let active: Vec<JSValue> = tables
        .active
        .iter()
        .map(|a| json!({"date": date_str(&a.date), "active": a.active}))
        .collect();

    let growth: Vec<JSValue> = tables
        .growth
        .iter()
        .map(|g| json!({"date": date_str(&g.date), "ratePct": g.rate_pct}))
        .collect();

    let locations: Vec<JSValue> = tables
        .locations
        .iter()
        .map(|l| {
            json!({
                "city": l.city,
                "positive": l.positive,
                "latitude": l.coordinates.map(|c| c.latitude),
                "longitude": l.coordinates.map(|c| c.longitude),
                "mappable": l.is_mappable(),
            })
        })
        .collect();

    let b = &tables.breakdowns;
    let breakdowns = json!({
        "importFactor": breakdown_to_json(&b.import_factor, |k| json!(import_factor_name(k))),
        "city": breakdown_to_json(&b.city, |k| json!(k)),
        "age": breakdown_to_json(&b.age, |k| json!(k)),
        "sex": breakdown_to_json(&b.sex, |k| json!(sex_name(k))),
        "residency": breakdown_to_json(&b.residency, |k| json!(residency_name(k))),
        "sourceCountry": breakdown_to_json(&b.source_country, |k| json!(k)),
    });

    let timeline: Vec<JSValue> = tables
        .import_factor_timeline
        .iter()
        .map(|p| {
            json!({
                "date": date_str(&p.date),
                "imported": p.imported,
                "contact": p.contact,
                "community": p.community,
            })
        })
        .collect();

    json!({
        "config": {
            "dashboard": settings.dashboard_name,
            "country": settings.country,
            "lastUpdated": settings.last_updated,
            "asOf": tables.summary.as_of.as_ref().map(date_str),
        },
        "summary": summary_to_json(&tables.summary),
        "dailyTotals": daily_totals,
        "active": active,
        "growth": growth,
        "locations": locations,
        "breakdowns": breakdowns,
        "importFactorTimeline": timeline,
        "averages": {
            "meanAge": tables.averages.mean_age,
            "meanHospitalizationDays": tables.averages.mean_hospitalization_days,
        },
    })
}

fn show<T: ToString>(x: Option<T>) -> String {
    x.map(|v| v.to_string())
        .unwrap_or_else(|| UNDEFINED.to_string())
}

fn show_pct(x: Option<f64>) -> String {
    x.map(|v| format!("{}%", v))
        .unwrap_or_else(|| UNDEFINED.to_string())
}

/// The headline figures, one per line.
pub fn headline(settings: &OutputSettings, tables: &DerivedTables) -> String {
    let s = &tables.summary;
    let mut output = String::new();
    let title = settings
        .dashboard_name
        .as_deref()
        .unwrap_or("COVID-19 dashboard");
    let _ = writeln!(output, "{}", title);
    let _ = writeln!(output, "As of: {}", show(s.as_of.as_ref().map(date_str)));
    let _ = writeln!(output, "Currently sick: {}", show(s.currently_sick));
    let _ = writeln!(output, "Deaths: {}", show(s.total_deaths));
    let _ = writeln!(output, "Recoveries: {}", show(s.total_recovered));
    let _ = writeln!(output, "Recovery rate: {}", show_pct(s.recovery_pct));
    let _ = writeln!(
        output,
        "Daily growth (smoothed): {}",
        show_pct(s.growth_rate_pct)
    );
    let _ = writeln!(output, "Confirmed cases: {}", show(s.total_confirmed));
    let _ = writeln!(output, "Negative tests: {}", show(s.total_negative));
    let _ = writeln!(output, "Tests: {}", show(s.total_tests));
    let _ = write!(output, "Positive tests: {}", show_pct(s.positive_test_pct));
    output
}
