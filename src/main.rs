use anyhow::{anyhow, bail, Context, Result};
use finance_tracker::{
    init_tracing, AppConfig, CategorizationEngine, CategorizationRequest, CategorizationResult,
    TransactionKind, UserCategory,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

const USAGE: &str = "Usage:
  finance-tracker categorize <income|expense> <description> [category,category,...]
  finance-tracker batch <input.csv> <output.csv>
  finance-tracker labels <income|expense>";

fn main() -> Result<()> {
    let config = AppConfig::from_env();
    init_tracing(&config.log_filter);

    let args: Vec<String> = env::args().collect();
    let engine = config.build_engine()?;

    match args.get(1).map(String::as_str) {
        Some("categorize") => run_categorize(&engine, &args[2..]),
        Some("batch") => run_batch(&engine, &args[2..]),
        Some("labels") => run_labels(&engine, &args[2..]),
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

fn parse_kind(raw: Option<&String>) -> Result<TransactionKind> {
    let raw = raw.ok_or_else(|| anyhow!("missing transaction type\n{}", USAGE))?;
    Ok(raw.parse::<TransactionKind>()?)
}

/// Caller categories from a comma-separated list, or the dictionary defaults
fn candidates(engine: &CategorizationEngine, kind: TransactionKind, list: Option<&String>) -> Vec<UserCategory> {
    match list {
        Some(list) => UserCategory::from_names(
            list.split(',').map(str::trim).filter(|name| !name.is_empty()),
            kind,
        ),
        None => UserCategory::from_names(engine.dictionary().default_categories(kind), kind),
    }
}

fn run_categorize(engine: &CategorizationEngine, args: &[String]) -> Result<()> {
    let kind = parse_kind(args.first())?;
    let description = args
        .get(1)
        .ok_or_else(|| anyhow!("missing description\n{}", USAGE))?;

    let request = CategorizationRequest::new(description.as_str(), kind, candidates(engine, kind, args.get(2)));
    let result = engine.categorize(&request)?;

    println!("Category:     {}", result.category);
    println!("Confidence:   {:.2}", result.confidence);
    if !result.alternatives.is_empty() {
        println!("Alternatives: {}", result.alternatives.join(", "));
    }

    Ok(())
}

fn run_labels(engine: &CategorizationEngine, args: &[String]) -> Result<()> {
    let kind = parse_kind(args.first())?;

    for set in engine.dictionary().lookup(kind) {
        println!("{}: {}", set.label, set.keywords.join(", "));
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct BatchRow {
    description: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct BatchOutput {
    description: String,
    #[serde(rename = "type")]
    kind: TransactionKind,
    category: String,
    confidence: f64,
    alternatives: String,
}

fn run_batch(engine: &CategorizationEngine, args: &[String]) -> Result<()> {
    let (input, output) = match args {
        [input, output, ..] => (Path::new(input), Path::new(output)),
        _ => bail!("batch needs an input and an output file\n{}", USAGE),
    };

    let count = categorize_csv(engine, input, output)?;
    println!("✓ Categorized {} transactions → {}", count, output.display());

    Ok(())
}

/// Read `description,type` rows, write them back with the suggested category.
/// Rows with a blank description or unknown type are skipped with a warning.
fn categorize_csv(engine: &CategorizationEngine, input: &Path, output: &Path) -> Result<usize> {
    let mut reader = csv::Reader::from_path(input)
        .with_context(|| format!("Failed to open CSV file {:?}", input))?;
    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("Failed to create CSV file {:?}", output))?;

    let mut written = 0;

    for (line, row) in reader.deserialize::<BatchRow>().enumerate() {
        let row = row.with_context(|| format!("Failed to read row {}", line + 1))?;

        let kind = match row.kind.parse::<TransactionKind>() {
            Ok(kind) => kind,
            Err(err) => {
                tracing::warn!(row = line + 1, error = %err, "skipping row");
                continue;
            }
        };

        let request = CategorizationRequest::new(row.description.as_str(), kind, candidates(engine, kind, None));
        let CategorizationResult {
            category,
            confidence,
            alternatives,
        } = match engine.categorize(&request) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(row = line + 1, error = %err, "skipping row");
                continue;
            }
        };

        writer.serialize(BatchOutput {
            description: row.description,
            kind,
            category,
            confidence,
            alternatives: alternatives.join("|"),
        })?;
        written += 1;
    }

    writer.flush()?;
    Ok(written)
}
