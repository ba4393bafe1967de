use clap::Parser;

/// Computes the figures behind a COVID-19 dashboard from a file of case records.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the data sources, the location lookup
    /// and the aggregation rules. See the manual of the case_stats crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The file containing the case records. Setting this option overrides the
    /// sources that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default ;) The field delimiter of a csv input.
    #[clap(long, value_parser)]
    pub delimiter: Option<char>,

    /// (file path, optional) The comma-separated file with the coordinates of the cities.
    #[clap(long, value_parser)]
    pub cities: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the derived tables will be written in JSON
    /// format to the given location. Setting this option overrides the output directory of the
    /// --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the expected tables in JSON format. If provided,
    /// casedash will check that its output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, records with an unreadable date are dropped instead of
    /// failing the whole run.
    #[clap(long, takes_value = false)]
    pub skip_bad_dates: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
