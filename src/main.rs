use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context};
use serde::Serialize;

use oxideinsight::data::parser::ColumnNames;
use oxideinsight::data::value::RawValue;
use oxideinsight::state::rate_history::RateBook;
use oxideinsight::{
    analyze_dataset_numbers, analyze_dataset_rich_with, analyze_dataset_with, compare_datasets,
    normalize_text_to_two_column_csv, AnalysisMeta, DatasetInput, InsightSettings,
};

const USAGE: &str = "usage: oxideinsight <analyze|numbers|compare|normalize|insights|rates> [--config FILE] [--columns X,Y]
Input is read from stdin; results are printed as JSON.";

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let Some(command) = args.next() else {
        bail!(USAGE);
    };

    let mut config: Option<PathBuf> = None;
    let mut meta = AnalysisMeta::default();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a file path")?;
                config = Some(PathBuf::from(path));
            }
            "--columns" => {
                let names = args.next().context("--columns needs X,Y column names")?;
                meta.columns = Some(ColumnNames::parse(&names));
            }
            other => bail!("unexpected argument {other:?}\n{USAGE}"),
        }
    }

    let settings = match &config {
        Some(path) => InsightSettings::load(path).map_err(anyhow::Error::msg)?,
        None => InsightSettings::default(),
    };

    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;

    match command.as_str() {
        "analyze" => {
            let data: DatasetInput =
                serde_json::from_str(&input).context("Failed to parse dataset JSON")?;
            match analyze_dataset_with(&data, &meta, &settings) {
                Ok(analysis) => print_json(&analysis)?,
                Err(e) => {
                    tracing::warn!("Analysis unavailable: {e}");
                    print_json(&e)?
                }
            }
        }
        "numbers" => {
            let values: Vec<RawValue> =
                serde_json::from_str(&input).context("Expected a JSON array of values")?;
            print_json(&analyze_dataset_numbers(&values))?;
        }
        "compare" => {
            let (a, b): (Vec<RawValue>, Vec<RawValue>) =
                serde_json::from_str(&input).context("Expected a JSON array [seriesA, seriesB]")?;
            print_json(&compare_datasets(&a, &b))?;
        }
        "normalize" => print_json(&normalize_text_to_two_column_csv(&input))?,
        "insights" => {
            let normalized = normalize_text_to_two_column_csv(&input);
            tracing::info!("{}", normalized.explanation);
            let data = DatasetInput::Text(normalized.csv);
            match analyze_dataset_rich_with(&data, &meta, &settings) {
                Ok(analysis) => println!("{}", analysis.plain_text),
                Err(e) => {
                    tracing::warn!("Analysis unavailable: {e}");
                    println!("Insights unavailable.");
                }
            }
        }
        "rates" => {
            let book: RateBook =
                serde_json::from_str(&input).context("Failed to parse rate history JSON")?;
            let snapshots: Vec<_> = book
                .iter()
                .map(|(name, history)| {
                    let snapshot = history.latest_with_trend();
                    RateRow {
                        rate: name.as_str(),
                        value: snapshot.display_value(),
                        trend: snapshot.trend.label(),
                    }
                })
                .collect();
            print_json(&snapshots)?;
        }
        other => bail!("unknown command {other:?}\n{USAGE}"),
    }

    Ok(())
}

#[derive(Serialize)]
struct RateRow<'a> {
    rate: &'a str,
    value: String,
    trend: &'static str,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{json}");
    Ok(())
}
