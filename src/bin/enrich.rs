//! enrich - Categorical Annotation Enrichment CLI
//!
//! Command-line interface for composable categorical enrichment analysis.

use clap::{Parser, Subcommand, ValueEnum};
use composable_enrichment::count::{count_entities, CountSpec};
use composable_enrichment::data::{DivisionPolicy, Table};
use composable_enrichment::error::Result;
use composable_enrichment::expand::{expand_multi_value, ExpandOptions};
use composable_enrichment::pipeline::{
    run_category_enrichment, Analysis, AnalysisConfig, AnalysisReport,
};
use composable_enrichment::profile::{class_distribution, presence_summary, profile_numeric};
use composable_enrichment::rank::{select_grid, Metric};
use log::info;
use std::path::{Path, PathBuf};

/// CLI-friendly division policy enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliPolicy {
    /// Fractions with an empty denominator are 0
    Zero,
    /// Fractions with an empty denominator are NaN
    Nan,
}

impl From<CliPolicy> for DivisionPolicy {
    fn from(policy: CliPolicy) -> Self {
        match policy {
            CliPolicy::Zero => DivisionPolicy::Zero,
            CliPolicy::Nan => DivisionPolicy::NaN,
        }
    }
}

/// Output format for profiles
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    Yaml,
}

/// Categorical Annotation Enrichment
#[derive(Parser)]
#[command(name = "enrich")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how often each class occurs
    Classes {
        /// Path to the annotated variant TSV
        #[arg(short, long)]
        input: PathBuf,

        /// Column holding the class label
        #[arg(long, default_value = "ONCOGENIC")]
        class_column: String,

        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Summarise presence of an annotation column per class
    Presence {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long, default_value = "ONCOGENIC")]
        class_column: String,

        /// Annotation column (e.g. DOMAIN_NAME, IS_HOTSPOT)
        #[arg(long)]
        column: String,

        /// Classes to report, comma-separated (default: all)
        #[arg(long, value_delimiter = ',')]
        classes: Vec<String>,

        #[arg(long, value_enum, default_value = "zero")]
        policy: CliPolicy,

        /// Output path for a TSV summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Profile a numeric annotation (e.g. population allele frequency)
    ProfileNumeric {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long, default_value = "ONCOGENIC")]
        class_column: String,

        /// Class to profile
        #[arg(long, default_value = "Oncogenic")]
        class: String,

        /// Numeric column
        #[arg(long, default_value = "gnomAD_AF")]
        column: String,

        /// Values above this are counted as common
        #[arg(long, default_value = "0.01")]
        threshold: f64,

        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Run a quick two-class category enrichment
    Enrich {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(long, default_value = "ONCOGENIC")]
        class_column: String,

        /// Multi-valued category column (e.g. DOMAIN_NAME)
        #[arg(long)]
        category_column: String,

        /// Numerator class
        #[arg(long, default_value = "Oncogenic")]
        class_a: String,

        /// Denominator class
        #[arg(long, default_value = "Likely Neutral")]
        class_b: String,

        /// Number of top categories to print
        #[arg(long, default_value = "10")]
        top: usize,

        /// Output path for the enrichment TSV
        #[arg(short, long)]
        output: PathBuf,

        /// Entity column for an entity × category grid (e.g. HUGO_SYMBOL)
        #[arg(long)]
        entity_column: Option<String>,

        /// Grid columns
        #[arg(long, default_value = "15")]
        n_categories: usize,

        /// Grid rows
        #[arg(long, default_value = "20")]
        n_entities: usize,

        /// Output path for the grid count matrix TSV
        #[arg(long)]
        grid_output: Option<PathBuf>,
    },

    /// Run an analysis from a YAML configuration file
    Run {
        /// Path to analysis configuration YAML
        #[arg(short, long)]
        config: PathBuf,

        #[arg(short, long)]
        input: PathBuf,

        /// Output path for the report (.json or .yaml)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Generate an example analysis configuration
    Example {
        /// Output path for the YAML config
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Classes {
            input,
            class_column,
            format,
        } => cmd_classes(&input, &class_column, format),

        Commands::Presence {
            input,
            class_column,
            column,
            classes,
            policy,
            output,
        } => cmd_presence(&input, &class_column, &column, &classes, policy, output.as_ref()),

        Commands::ProfileNumeric {
            input,
            class_column,
            class,
            column,
            threshold,
            format,
        } => cmd_profile_numeric(&input, &class_column, &class, &column, threshold, format),

        Commands::Enrich {
            input,
            class_column,
            category_column,
            class_a,
            class_b,
            top,
            output,
            entity_column,
            n_categories,
            n_entities,
            grid_output,
        } => cmd_enrich(
            &input,
            &class_column,
            &category_column,
            &class_a,
            &class_b,
            top,
            &output,
            entity_column.as_deref(),
            n_categories,
            n_entities,
            grid_output.as_ref(),
        ),

        Commands::Run {
            config,
            input,
            output,
        } => cmd_run(&config, &input, &output),

        Commands::Example { output } => cmd_example(&output),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_table(path: &Path) -> Result<Table> {
    info!("Loading table from {:?}...", path);
    let table = Table::from_tsv(path)?;
    info!("Loaded {} rows x {} columns", table.n_rows(), table.n_columns());
    Ok(table)
}

fn print_formatted<T>(value: &T, format: Format) -> Result<()>
where
    T: serde::Serialize + std::fmt::Display,
{
    match format {
        Format::Text => print!("{}", value),
        Format::Json => println!("{}", serde_json::to_string_pretty(value)?),
        Format::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}

/// Class distribution
fn cmd_classes(input: &Path, class_column: &str, format: Format) -> Result<()> {
    let table = load_table(input)?;
    let distribution = class_distribution(&table, class_column)?;
    print_formatted(&distribution, format)
}

/// Presence of an annotation per class
fn cmd_presence(
    input: &Path,
    class_column: &str,
    column: &str,
    classes: &[String],
    policy: CliPolicy,
    output: Option<&PathBuf>,
) -> Result<()> {
    let table = load_table(input)?;
    let classes = (!classes.is_empty()).then_some(classes);
    let summary = presence_summary(&table, class_column, column, classes, policy.into())?;

    print!("{}", summary);
    if let Some(path) = output {
        info!("Writing presence summary to {:?}...", path);
        summary.to_tsv(path)?;
    }
    Ok(())
}

/// Numeric annotation profile
fn cmd_profile_numeric(
    input: &Path,
    class_column: &str,
    class: &str,
    column: &str,
    threshold: f64,
    format: Format,
) -> Result<()> {
    let table = load_table(input)?;
    let profile = profile_numeric(&table, class_column, class, column, threshold)?;
    print_formatted(&profile, format)
}

/// Quick two-class category enrichment
#[allow(clippy::too_many_arguments)]
fn cmd_enrich(
    input: &Path,
    class_column: &str,
    category_column: &str,
    class_a: &str,
    class_b: &str,
    top: usize,
    output: &Path,
    entity_column: Option<&str>,
    n_categories: usize,
    n_entities: usize,
    grid_output: Option<&PathBuf>,
) -> Result<()> {
    let table = load_table(input)?;

    info!("Running category enrichment...");
    info!("  Categories: {}", category_column);
    info!("  Classes: {} / {}", class_a, class_b);
    let report =
        run_category_enrichment(&table, class_column, category_column, class_a, class_b, top)?;

    for expansion in &report.expansions {
        info!("{}", expansion.to_string().trim_end());
    }

    if let Some(enrichment) = report.enrichment.first() {
        info!("Writing enrichment to {:?}...", output);
        enrichment.to_tsv(output)?;
        info!("Done! {} categories scored", enrichment.len());
    }

    if let Some(ranking) = report.top_categories.first() {
        println!("Top {} categories by {}:", ranking.ranked.len(), ranking.metric);
        for r in &ranking.ranked {
            println!("  {:>3}. {:<40} {:.3}", r.rank, r.key, r.value);
        }
    }

    if let Some(entity_column) = entity_column {
        let spec = CountSpec::new(class_column, category_column).with_classes(&[class_a, class_b]);
        let expanded = expand_multi_value(&table, category_column, &ExpandOptions::new())?;
        let counts = count_entities(&expanded.table, entity_column, &spec)?;
        let volume = counts.volume(None)?;
        let grid = select_grid(&volume, n_categories, n_entities);
        let matrix = grid.count_matrix(&volume)?;
        let (rows, cols) = matrix.shape();
        info!("Grid: {} {} x {} categories", rows, entity_column, cols);

        if let Some(path) = grid_output {
            info!("Writing grid to {:?}...", path);
            matrix.to_tsv(path)?;
        }
    }

    Ok(())
}

fn write_report(report: &AnalysisReport, output: &Path) -> Result<()> {
    let is_yaml = output
        .extension()
        .map(|ext| ext == "yaml" || ext == "yml")
        .unwrap_or(false);
    let content = if is_yaml {
        report.to_yaml()?
    } else {
        report.to_json()?
    };
    std::fs::write(output, content)?;
    Ok(())
}

/// Run an analysis from configuration
fn cmd_run(config_path: &Path, input: &Path, output: &Path) -> Result<()> {
    info!("Loading analysis configuration from {:?}...", config_path);
    let config_str = std::fs::read_to_string(config_path)?;
    let config = AnalysisConfig::from_yaml(&config_str)?;

    let table = load_table(input)?;

    info!("Running analysis '{}'...", config.name);
    let report = Analysis::from_config(&config).run(&table)?;

    info!("Writing report to {:?}...", output);
    write_report(&report, output)?;

    print!("{}", report);
    Ok(())
}

/// Generate example analysis configuration
fn cmd_example(output_path: &Path) -> Result<()> {
    let analysis = Analysis::new("ONCOGENIC")
        .name("example-domain-enrichment")
        .filter_classes(&["Oncogenic", "Likely Neutral"])
        .expand("DOMAIN_NAME")
        .count_classes("DOMAIN_NAME", &["Oncogenic", "Likely Neutral"])
        .enrich("Oncogenic", "Likely Neutral")
        .top_categories(
            Metric::Ratio {
                class_a: "Oncogenic".to_string(),
                class_b: "Likely Neutral".to_string(),
            },
            20,
        )
        .entity_grid("HUGO_SYMBOL", 15, 20)
        .top_entities_per_category("HUGO_SYMBOL", "Oncogenic", 10);

    let config = analysis.to_config(Some(
        "Example protein-domain enrichment of oncogenic over likely neutral variants",
    ));
    let yaml = config.to_yaml()?;

    std::fs::write(output_path, &yaml)?;
    info!("Wrote example analysis to {:?}", output_path);
    println!("{}", yaml);

    Ok(())
}
