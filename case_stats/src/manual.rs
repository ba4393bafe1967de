/*!

This is the long-form manual for `case_stats` and `casedash`.

## Input format

The case data is a delimited text file (semicolon by default) or an Excel
workbook (.xlsx), with one row per reported event and a header row.
The following columns are read. Only `Date` is mandatory, a missing column is
treated as if all its cells were empty.

| column                      | meaning                                               |
|-----------------------------|-------------------------------------------------------|
| `Date`                      | day of the report, day first, four-digit year         |
| `Positif`                   | number of positive tests                              |
| `Negatif`                   | number of negative tests                              |
| `Décédé`                    | number of deaths                                      |
| `Guéri`                     | number of recoveries                                  |
| `Ville`                     | city of the patient                                   |
| `Age`                       | age of the patient, in years                          |
| `Homme`, `Femme`            | `1` in the column matching the sex of the patient      |
| `Resident Senegal`          | `Oui` / `Non`                                         |
| `Facteur`                   | `Importé`, `Contact` or `Communauté`                  |
| `Source/Voyage`             | country the patient travelled from                    |
| `Temps Hospitalisation (j)` | days spent in hospital                                |

The location lookup is a comma-separated file with the columns `Ville`,
`Latitude` and `Longitude`.

## Outputs

All the tables are recomputed from scratch for every load.

### Daily totals

One row per date found in the data, in chronological order. Each outcome is
summed over the day and accumulated since the first date. A date where an
outcome has no report keeps the previous total. With `fillMissingDates`, the
calendar days where nothing was reported are added too.

### Active cases

`positive - recovered` for each row of the daily totals. The value is not
clamped at zero, so inconsistent data stays visible.

### Growth rate

The daily growth of the cumulative positives, smoothed over a window of
`W` rows (2 by default):

```text
growth[t] = sqrt(positive[t] / positive[t - W]) - 1
```

It is expressed in percent. The first `W` rows, and rows where
`positive[t - W]` is zero, have no growth rate (`null` in the JSON output, `—`
in the headline).

### Summary

Read from the last row of the daily totals: confirmed cases, negative tests,
deaths, recoveries, currently sick (`positive - recovered`), recovery
percentage (`recovered / positive`), number of tests
(`positive + negative`), positive test percentage (`positive / tests`) and the
latest growth rate (rounded like the other percentages). A percentage with a
zero denominator is undefined. All the figures are undefined for an empty
dataset.

### Locations

Positive cases summed per city, with the coordinates from the lookup. Cities
missing from the lookup are kept without coordinates, unless
`onUnknownLocation` is `abort`.

### Breakdowns

Counts of records per import factor, city, age (whole years), sex, residency
and source country. Records where the field is empty are not counted.
The import factors are also given as a timeline: the running count of each
factor, following the records in date order.

### Averages

The mean age of the patients and the mean time spent in hospital. Empty or
negative values are left out. Both are undefined when no record has a value.

## Configuration

`casedash` accepts a JSON configuration file with the `--config` flag:

```json
{
  "outputSettings": {
    "dashboardName": "COVID-19 au Sénégal",
    "country": "Senegal",
    "outputDirectory": "out"
  },
  "caseSources": [
    { "provider": "csv", "filePath": "COVID_Senegal.csv", "delimiter": ";" }
  ],
  "locationSource": { "filePath": "city_coordinates.csv" },
  "rules": {
    "growthWindow": 2,
    "percentageDecimals": 1,
    "growthDecimals": 2,
    "onMalformedDate": "abort",
    "onUnknownLocation": "nullCoordinate",
    "fillMissingDates": false
  }
}
```

Relative paths are resolved from the directory of the configuration file.
The providers are `csv` and `xlsx` (in which case `excelWorksheetName` selects
the sheet, the first one by default).

`onMalformedDate` is `abort` (default) or `skipRecord`. `onUnknownLocation` is
`nullCoordinate` (default) or `abort`.

*/
