//! Example of protein-domain enrichment across variant classes.
//!
//! This example shows how to:
//! 1. Build a small annotated variant table
//! 2. Profile class sizes and domain presence
//! 3. Expand and count a multi-valued domain column
//! 4. Score domains and gene x domain pairs
//! 5. Run the same analysis as a pipeline

use composable_enrichment::prelude::*;

fn main() -> Result<()> {
    println!("=== Composable Enrichment Example ===\n");

    let table = create_example_data()?;
    println!("Data dimensions:");
    println!("  Rows:    {}", table.n_rows());
    println!("  Columns: {}", table.n_columns());
    println!();

    // Profile the data
    println!("=== Data Profiling ===\n");

    let distribution = class_distribution(&table, "ONCOGENIC")?;
    print!("{}", distribution);
    println!();

    let presence =
        presence_summary(&table, "ONCOGENIC", "DOMAIN_NAME", None, DivisionPolicy::Zero)?;
    print!("{}", presence);
    println!();

    // Step by step
    println!("=== Counting Domains ===\n");

    let expansion = expand_multi_value(&table, "DOMAIN_NAME", &ExpandOptions::new())?;
    print!("{}", expansion.summary());

    let spec = CountSpec::new("ONCOGENIC", "DOMAIN_NAME")
        .with_classes(&["Oncogenic", "Likely Neutral"]);
    let counts = count_expanded(&expansion, &spec)?;
    for category in counts.categories() {
        println!(
            "  {:<20} oncogenic {:>2} ({:.2})  neutral {:>2} ({:.2})",
            category,
            counts.count(category, "Oncogenic"),
            counts.fraction(category, "Oncogenic", DivisionPolicy::Zero),
            counts.count(category, "Likely Neutral"),
            counts.fraction(category, "Likely Neutral", DivisionPolicy::Zero),
        );
    }
    println!();

    println!("=== Enrichment ===\n");

    let enrichment = enrich_categories(&counts, "Oncogenic", "Likely Neutral")?;
    for entry in enrichment.sorted_by_ratio() {
        println!("  {:<20} {:.3}", entry.key, entry.ratio);
    }
    println!();

    let entity_counts = count_entities(&expansion.table, "HUGO_SYMBOL", &spec)?;
    let pairs = enrich_pairs(&entity_counts, "Oncogenic", "Likely Neutral")?;
    println!("Gene x domain pairs: {}", pairs.len());
    for pair in pairs.for_category("Kinase") {
        println!("  {:<8} {:.3}", pair.entity, pair.ratio);
    }
    println!();

    // The same analysis as a pipeline
    println!("=== Running Pipeline ===\n");

    let report = Analysis::new("ONCOGENIC")
        .name("domain-example")
        .filter_classes(&["Oncogenic", "Likely Neutral"])
        .expand("DOMAIN_NAME")
        .count("DOMAIN_NAME")
        .enrich("Oncogenic", "Likely Neutral")
        .top_categories(Metric::Total, 3)
        .entity_grid("HUGO_SYMBOL", 3, 4)
        .top_entities_per_category("HUGO_SYMBOL", "Oncogenic", 2)
        .run(&table)?;

    print!("{}", report);

    if let Some(grid) = report.grids.first() {
        println!("\nGrid ({} x {}):", grid.counts.shape().0, grid.counts.shape().1);
        println!("  {:<8} {}", "", grid.counts.col_labels().join("  "));
        for (label, row) in grid.counts.row_labels().iter().zip(grid.counts.to_rows()) {
            let cells: Vec<String> = row.iter().map(|v| format!("{:.0}", v)).collect();
            println!("  {:<8} {}", label, cells.join("  "));
        }
    }

    Ok(())
}

/// Small table in the shape of an annotated variant export.
fn create_example_data() -> Result<Table> {
    let rows = [
        ("EGFR", "Oncogenic", Some("Kinase;SH2")),
        ("EGFR", "Oncogenic", Some("Kinase")),
        ("EGFR", "Likely Neutral", Some("Kinase")),
        ("BRAF", "Oncogenic", Some("Kinase")),
        ("BRAF", "Oncogenic", Some("Kinase")),
        ("BRAF", "Likely Neutral", Some("RBD")),
        ("KRAS", "Oncogenic", Some("GTPase")),
        ("KRAS", "Oncogenic", Some("GTPase")),
        ("PIK3CA", "Oncogenic", Some("PI3K; C2")),
        ("PIK3CA", "Likely Neutral", Some("C2")),
        ("TP53", "Oncogenic", Some("p53 DNA-binding")),
        ("TP53", "Likely Neutral", None),
        ("BRCA2", "Unknown", Some("BRCT")),
    ];

    let columns = vec![
        "HUGO_SYMBOL".to_string(),
        "ONCOGENIC".to_string(),
        "DOMAIN_NAME".to_string(),
    ];
    let values = rows
        .iter()
        .map(|&(gene, class, domain)| vec![gene.into(), class.into(), domain.into()])
        .collect();

    Table::new(columns, values)
}
