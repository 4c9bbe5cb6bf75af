//! Integration tests for categorical enrichment from a TSV table.

use approx::assert_relative_eq;
use composable_enrichment::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

/// Write a small annotated variant table to a temporary TSV.
fn create_variant_tsv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "HUGO_SYMBOL\tONCOGENIC\tDOMAIN_NAME\tFEATURE_TYPE\tIS_HOTSPOT\tgnomAD_AF"
    )
    .unwrap();
    let rows = [
        ("EGFR", "Oncogenic", "Kinase; SH2", "Region", "true", "NA"),
        ("EGFR", "Oncogenic", "Kinase", "Region", "true", "0.0001"),
        ("EGFR", "Likely Neutral", "Kinase", "NA", "false", "0.02"),
        ("KRAS", "Oncogenic", "GTPase", "Binding site", "true", "NA"),
        ("KRAS", "Oncogenic", "GTPase", "Binding site", "false", "0.003"),
        ("KRAS", "Oncogenic", "GTPase", "Binding site", "true", "NA"),
        ("TP53", "Likely Neutral", "p53 DNA-binding", "Region;Site", "false", "0.3"),
        ("TP53", "Likely Neutral", "NA", "NA", "false", "0.15"),
        ("BRCA2", "Unknown", "BRCT", "Repeat", "false", "NA"),
        ("PIK3CA", "Oncogenic", "PI3K", "NA", "true", "0.00002"),
    ];
    for (gene, class, domain, feature, hotspot, af) in rows {
        writeln!(
            file,
            "{}\t{}\t{}\t{}\t{}\t{}",
            gene, class, domain, feature, hotspot, af
        )
        .unwrap();
    }
    file.flush().unwrap();
    file
}

fn load() -> Table {
    let file = create_variant_tsv();
    Table::from_tsv(file.path()).unwrap()
}

#[test]
fn test_end_to_end_domain_enrichment() {
    let table = Table::new(
        vec!["ONCOGENIC".into(), "DOMAIN_NAME".into()],
        vec![
            vec!["Oncogenic".into(), "Kinase;SH2".into()],
            vec!["Oncogenic".into(), "Kinase".into()],
            vec!["Neutral".into(), "Kinase".into()],
        ],
    )
    .unwrap();

    let expansion = expand_multi_value(&table, "DOMAIN_NAME", &ExpandOptions::new()).unwrap();
    assert_eq!(expansion.n_rows(), 4);

    let counts = count_expanded(&expansion, &CountSpec::new("ONCOGENIC", "DOMAIN_NAME")).unwrap();
    assert_eq!(counts.count("Kinase", "Oncogenic"), 2);
    assert_eq!(counts.count("Kinase", "Neutral"), 1);
    assert_eq!(counts.count("SH2", "Oncogenic"), 1);
    assert_eq!(counts.count("SH2", "Neutral"), 0);

    let enrichment = enrich_categories(&counts, "Oncogenic", "Neutral").unwrap();
    assert_relative_eq!(enrichment.ratio("Kinase").unwrap(), 1.5);
    assert_relative_eq!(enrichment.ratio("SH2").unwrap(), 2.0);

    let top = rank_categories(&counts, &Metric::Total, 1).unwrap();
    assert_eq!(top[0].key, "Kinase");
}

#[test]
fn test_load_tsv() {
    let table = load();
    assert_eq!(table.n_rows(), 10);
    assert_eq!(table.n_columns(), 6);
    assert!(table.value(0, 5).unwrap().is_missing());
    assert_eq!(table.value(1, 5).unwrap().as_number(), Some(0.0001));

    let distribution = class_distribution(&table, "ONCOGENIC").unwrap();
    assert_eq!(distribution.labels(), vec!["Oncogenic", "Likely Neutral", "Unknown"]);
    assert_eq!(distribution.count("Oncogenic"), 6);
}

#[test]
fn test_whitespace_tokens_are_trimmed() {
    let table = load();
    let expansion = expand_multi_value(&table, "DOMAIN_NAME", &ExpandOptions::new()).unwrap();
    let counts = count_expanded(&expansion, &CountSpec::new("ONCOGENIC", "DOMAIN_NAME")).unwrap();

    assert!(counts.categories().iter().all(|c| c.trim() == c));
    assert_eq!(counts.count("SH2", "Oncogenic"), 1);
    assert_eq!(expansion.n_missing, 1);
}

#[test]
fn test_functional_sites_pipeline() {
    let table = load();
    let report = Analysis::new("ONCOGENIC")
        .name("functional-sites")
        .filter_classes(&["Oncogenic", "Likely Neutral"])
        .expand("FEATURE_TYPE")
        .count_classes("FEATURE_TYPE", &["Oncogenic", "Likely Neutral"])
        .enrich("Oncogenic", "Likely Neutral")
        .top_categories(Metric::Fraction("Oncogenic".into()), 2)
        .entity_grid("HUGO_SYMBOL", 2, 3)
        .run(&table)
        .unwrap();

    let enrichment = &report.enrichment[0];
    // Binding site 3 vs 0, Region 2 vs 1, Site 0 vs 1
    assert_relative_eq!(enrichment.ratio("Binding site").unwrap(), 4.0);
    assert_relative_eq!(enrichment.ratio("Region").unwrap(), 1.5);
    assert_relative_eq!(enrichment.ratio("Site").unwrap(), 0.5);

    let top = &report.top_categories[0].ranked;
    assert_eq!(top[0].key, "Binding site");
    assert_relative_eq!(top[0].value, 0.6);

    let grid = &report.grids[0];
    assert_eq!(grid.counts.row_labels(), &["KRAS", "EGFR", "TP53"]);
    for sum in grid.shares.col_sums() {
        assert!(sum <= 1.0 + 1e-12);
    }
}

#[test]
fn test_hotspot_views() {
    let table = load();

    let summary = presence_summary(
        &table,
        "ONCOGENIC",
        "IS_HOTSPOT",
        Some(&["Oncogenic".to_string(), "Likely Neutral".to_string()]),
        DivisionPolicy::Zero,
    )
    .unwrap();
    let onco = summary.get("Oncogenic").unwrap();
    assert_eq!((onco.present, onco.total), (5, 6));

    let spec = CountSpec::new("ONCOGENIC", "IS_HOTSPOT").with_classes(&["Oncogenic"]);
    let counts = count_entities(&table, "HUGO_SYMBOL", &spec).unwrap();
    let summaries = entity_shares(counts.layer("Oncogenic").unwrap(), "true", DivisionPolicy::Zero);
    let hotspot_genes = filter_entities(&summaries, 2, 0.5).unwrap();

    let genes: Vec<_> = hotspot_genes.iter().map(|s| s.entity.as_str()).collect();
    assert_eq!(genes, vec!["KRAS", "EGFR"]);
    assert_relative_eq!(hotspot_genes[0].fraction, 2.0 / 3.0);
}

#[test]
fn test_allele_frequency_profile() {
    let table = load();
    let profile = profile_numeric(
        &table,
        "ONCOGENIC",
        "Oncogenic",
        "gnomAD_AF",
        DEFAULT_COMMON_THRESHOLD,
    )
    .unwrap();

    assert_eq!(profile.n_rows, 6);
    assert_eq!(profile.n_missing, 3);
    assert_eq!(profile.n_common, 0);
    assert_eq!(profile.n_rare, 3);
    assert_relative_eq!(profile.stats.unwrap().max, 0.003);
}

#[test]
fn test_outputs_written() {
    let table = load();
    let expansion = expand_multi_value(&table, "DOMAIN_NAME", &ExpandOptions::new()).unwrap();
    let spec = CountSpec::new("ONCOGENIC", "DOMAIN_NAME")
        .with_classes(&["Oncogenic", "Likely Neutral"]);
    let counts = count_expanded(&expansion, &spec).unwrap();

    let long = NamedTempFile::new().unwrap();
    counts.to_tsv(long.path(), DivisionPolicy::Zero).unwrap();
    let content = std::fs::read_to_string(long.path()).unwrap();
    assert!(content.starts_with("DOMAIN_NAME\tclass\tcount\tclass_total\tfraction"));
    // header + categories x classes
    assert_eq!(content.lines().count(), 1 + counts.categories().len() * 2);

    let pairs = enrich_pairs(
        &count_entities(&expansion.table, "HUGO_SYMBOL", &spec).unwrap(),
        "Oncogenic",
        "Likely Neutral",
    )
    .unwrap();
    let pair_file = NamedTempFile::new().unwrap();
    pairs.to_tsv(pair_file.path()).unwrap();
    let content = std::fs::read_to_string(pair_file.path()).unwrap();
    assert!(content.lines().any(|l| l.starts_with("EGFR\tKinase\t2\t1\t")));
}

#[test]
fn test_config_file_round_trip() {
    let config = Analysis::new("ONCOGENIC")
        .name("from-file")
        .filter_classes(&["Oncogenic", "Likely Neutral"])
        .expand("DOMAIN_NAME")
        .count("DOMAIN_NAME")
        .enrich("Oncogenic", "Likely Neutral")
        .to_config(None);

    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", config.to_yaml().unwrap()).unwrap();
    file.flush().unwrap();

    let yaml = std::fs::read_to_string(file.path()).unwrap();
    let parsed = AnalysisConfig::from_yaml(&yaml).unwrap();
    let report = Analysis::from_config(&parsed).run(&load()).unwrap();
    assert_eq!(report.name, "from-file");
    assert_relative_eq!(report.enrichment[0].ratio("Kinase").unwrap(), 1.5);
}
