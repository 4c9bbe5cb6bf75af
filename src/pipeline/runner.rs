//! Analysis runner for composing and executing enrichment steps.

use crate::count::{count_classes, count_entities, count_expanded, CountSpec, CountTable};
use crate::data::{ClassCountSet, DivisionPolicy, EnrichmentTable, Matrix, Table};
use crate::enrich::{class_shares, enrich_categories};
use crate::error::{EnrichError, Result};
use crate::expand::{expand_multi_value, ExpandOptions, Expansion, ExpansionSummary};
use crate::filter::filter_classes;
use crate::rank::{
    rank_categories, select_grid, top_entities_per_category, CategoryTop, GridSelection, Metric,
    Ranked,
};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// A step in the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisStep {
    // === Row Selection ===
    /// Keep rows of the given classes.
    FilterClasses { classes: Vec<String> },
    /// Add a `true`/`false` column marking presence of `source`.
    DerivePresence { source: String, name: String },

    // === Expansion ===
    /// Split a multi-valued column into one row per token.
    Expand {
        column: String,
        #[serde(default)]
        options: ExpandOptions,
    },

    // === Counting ===
    /// Only count these categories in the following count.
    KeepCategories { categories: Vec<String> },
    /// Count categories per class.
    Count {
        category_column: String,
        #[serde(default)]
        classes: Option<Vec<String>>,
    },

    // === Scoring and Ranking ===
    /// Smoothed ratio of `class_a` over `class_b` per category.
    Enrich { class_a: String, class_b: String },
    /// Top categories by a metric.
    TopCategories { metric: Metric, n: usize },
    /// Entity × category grid over the counted rows.
    EntityGrid {
        entity_column: String,
        n_categories: usize,
        n_entities: usize,
    },
    /// For every category, the entities with the largest share in one class.
    TopEntitiesPerCategory {
        entity_column: String,
        class: String,
        k: usize,
    },
}

/// Analysis configuration for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Name of the analysis.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Column holding the class label.
    pub class_column: String,
    /// Value of fractions with an empty denominator.
    #[serde(default)]
    pub policy: DivisionPolicy,
    /// Steps to execute.
    pub steps: Vec<AnalysisStep>,
}

impl AnalysisConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(EnrichError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(EnrichError::from)
    }
}

/// Builder for constructing and running analyses.
#[derive(Debug, Clone)]
pub struct Analysis {
    steps: Vec<AnalysisStep>,
    name: String,
    class_column: String,
    policy: DivisionPolicy,
}

impl Analysis {
    /// Create an empty analysis over `class_column`.
    pub fn new(class_column: &str) -> Self {
        Self {
            steps: Vec::new(),
            name: "unnamed".to_string(),
            class_column: class_column.to_string(),
            policy: DivisionPolicy::default(),
        }
    }

    /// Create from a config.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            steps: config.steps.clone(),
            name: config.name.clone(),
            class_column: config.class_column.clone(),
            policy: config.policy,
        }
    }

    /// Set the analysis name.
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set the division policy for empty denominators.
    pub fn policy(mut self, policy: DivisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Keep only rows of the given classes.
    pub fn filter_classes(mut self, classes: &[&str]) -> Self {
        self.steps.push(AnalysisStep::FilterClasses {
            classes: to_strings(classes),
        });
        self
    }

    /// Add a presence column derived from `source`.
    ///
    /// Useful to count hotspot membership or in/out of a domain as a
    /// two-valued category.
    pub fn derive_presence(mut self, source: &str, name: &str) -> Self {
        self.steps.push(AnalysisStep::DerivePresence {
            source: source.to_string(),
            name: name.to_string(),
        });
        self
    }

    /// Expand a `;`-separated column.
    pub fn expand(self, column: &str) -> Self {
        self.expand_with(column, ExpandOptions::new())
    }

    /// Expand a multi-valued column with explicit options.
    pub fn expand_with(mut self, column: &str, options: ExpandOptions) -> Self {
        self.steps.push(AnalysisStep::Expand {
            column: column.to_string(),
            options,
        });
        self
    }

    /// Restrict the next count to these categories.
    pub fn keep_categories(mut self, categories: &[&str]) -> Self {
        self.steps.push(AnalysisStep::KeepCategories {
            categories: to_strings(categories),
        });
        self
    }

    /// Count `category_column` per class over every observed class.
    pub fn count(mut self, category_column: &str) -> Self {
        self.steps.push(AnalysisStep::Count {
            category_column: category_column.to_string(),
            classes: None,
        });
        self
    }

    /// Count `category_column` per class over a fixed class universe.
    pub fn count_classes(mut self, category_column: &str, classes: &[&str]) -> Self {
        self.steps.push(AnalysisStep::Count {
            category_column: category_column.to_string(),
            classes: Some(to_strings(classes)),
        });
        self
    }

    /// Add category enrichment of `class_a` over `class_b`.
    pub fn enrich(mut self, class_a: &str, class_b: &str) -> Self {
        self.steps.push(AnalysisStep::Enrich {
            class_a: class_a.to_string(),
            class_b: class_b.to_string(),
        });
        self
    }

    /// Add a top-N category ranking.
    pub fn top_categories(mut self, metric: Metric, n: usize) -> Self {
        self.steps.push(AnalysisStep::TopCategories { metric, n });
        self
    }

    /// Add an entity × category grid.
    pub fn entity_grid(
        mut self,
        entity_column: &str,
        n_categories: usize,
        n_entities: usize,
    ) -> Self {
        self.steps.push(AnalysisStep::EntityGrid {
            entity_column: entity_column.to_string(),
            n_categories,
            n_entities,
        });
        self
    }

    /// Add the top `k` entities per category for one class.
    pub fn top_entities_per_category(mut self, entity_column: &str, class: &str, k: usize) -> Self {
        self.steps.push(AnalysisStep::TopEntitiesPerCategory {
            entity_column: entity_column.to_string(),
            class: class.to_string(),
            k,
        });
        self
    }

    /// Convert to config for serialization.
    pub fn to_config(&self, description: Option<&str>) -> AnalysisConfig {
        AnalysisConfig {
            name: self.name.clone(),
            description: description.map(String::from),
            class_column: self.class_column.clone(),
            policy: self.policy,
            steps: self.steps.clone(),
        }
    }

    /// Run the analysis on a table.
    pub fn run(&self, table: &Table) -> Result<AnalysisReport> {
        info!(
            "Running analysis '{}' ({} steps) on {} rows",
            self.name,
            self.steps.len(),
            table.n_rows()
        );
        let mut state = AnalysisState::new(table.clone(), self);

        for (i, step) in self.steps.iter().enumerate() {
            debug!("Step {}: {:?}", i + 1, step);
            state = state.apply(step).map_err(|e| {
                EnrichError::Pipeline(format!("Step {} ({:?}) failed: {}", i + 1, step, e))
            })?;
        }

        Ok(state.finalize(&self.name))
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// A ranking produced by a `TopCategories` step.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryRanking {
    pub metric: String,
    pub ranked: Vec<Ranked>,
}

/// Matrices produced by an `EntityGrid` step.
#[derive(Debug, Clone, Serialize)]
pub struct GridReport {
    pub entity_column: String,
    pub selection: GridSelection,
    /// Counts over all counted classes.
    pub counts: Matrix,
    /// Shares of each category's volume.
    pub shares: Matrix,
}

/// Output of a `TopEntitiesPerCategory` step.
#[derive(Debug, Clone, Serialize)]
pub struct EntityTopReport {
    pub entity_column: String,
    pub class: String,
    pub categories: Vec<CategoryTop>,
}

/// Everything an analysis produced, in plain serializable form.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub name: String,
    pub class_column: String,
    pub policy: DivisionPolicy,
    /// Rows in the input table.
    pub n_input_rows: usize,
    /// Rows after the last filter or expansion.
    pub n_rows: usize,
    pub expansions: Vec<ExpansionSummary>,
    /// Long-form counts of the last `Count` step.
    pub counts: Option<ClassCountSet>,
    pub enrichment: Vec<EnrichmentTable>,
    pub top_categories: Vec<CategoryRanking>,
    pub grids: Vec<GridReport>,
    pub top_entities: Vec<EntityTopReport>,
}

impl AnalysisReport {
    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(EnrichError::from)
    }

    /// Serialize as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(EnrichError::from)
    }
}

impl std::fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Analysis: {}", self.name)?;
        writeln!(f, "  Input rows:  {}", self.n_input_rows)?;
        writeln!(f, "  Final rows:  {}", self.n_rows)?;
        for e in &self.expansions {
            writeln!(
                f,
                "  Expanded {}: {} -> {} rows ({} missing)",
                e.column, e.n_source_rows, e.n_expanded_rows, e.n_missing
            )?;
        }
        for table in &self.enrichment {
            writeln!(f, "  Enrichment {} / {}:", table.class_a, table.class_b)?;
            for e in table.sorted_by_ratio().iter().take(10) {
                writeln!(
                    f,
                    "    {:<32} {:>6} {:>6} {:>8.3}",
                    e.key, e.count_a, e.count_b, e.ratio
                )?;
            }
        }
        for ranking in &self.top_categories {
            writeln!(f, "  Top categories by {}:", ranking.metric)?;
            for r in &ranking.ranked {
                writeln!(f, "    {:>3}. {:<32} {:.3}", r.rank, r.key, r.value)?;
            }
        }
        for grid in &self.grids {
            let (rows, cols) = grid.counts.shape();
            writeln!(f, "  Grid {} x category: {} x {}", grid.entity_column, rows, cols)?;
        }
        Ok(())
    }
}

/// Internal state during execution.
struct AnalysisState {
    table: Table,
    class_column: String,
    policy: DivisionPolicy,
    n_input_rows: usize,
    expansion: Option<Expansion>,
    allowed_categories: Option<Vec<String>>,
    spec: Option<CountSpec>,
    counts: Option<CountTable>,
    expansions: Vec<ExpansionSummary>,
    enrichment: Vec<EnrichmentTable>,
    top_categories: Vec<CategoryRanking>,
    grids: Vec<GridReport>,
    top_entities: Vec<EntityTopReport>,
}

impl AnalysisState {
    fn new(table: Table, analysis: &Analysis) -> Self {
        Self {
            n_input_rows: table.n_rows(),
            table,
            class_column: analysis.class_column.clone(),
            policy: analysis.policy,
            expansion: None,
            allowed_categories: None,
            spec: None,
            counts: None,
            expansions: Vec::new(),
            enrichment: Vec::new(),
            top_categories: Vec::new(),
            grids: Vec::new(),
            top_entities: Vec::new(),
        }
    }

    /// Rows of the table currently being analysed.
    fn current(&self) -> &Table {
        self.expansion.as_ref().map(|e| &e.table).unwrap_or(&self.table)
    }

    /// Steps that change the rows must run before the count they feed.
    fn require_uncounted(&self) -> Result<()> {
        if self.counts.is_some() {
            return Err(EnrichError::Pipeline(
                "Rows cannot change after counting".to_string(),
            ));
        }
        Ok(())
    }

    fn apply(mut self, step: &AnalysisStep) -> Result<Self> {
        match step {
            // === Row Selection ===
            AnalysisStep::FilterClasses { classes } => {
                self.require_uncounted()?;
                if self.expansion.is_some() {
                    return Err(EnrichError::Pipeline(
                        "Must filter classes before expanding".to_string(),
                    ));
                }
                self.table = filter_classes(&self.table, &self.class_column, classes)?;
                debug!("{} rows after class filter", self.table.n_rows());
            }
            AnalysisStep::DerivePresence { source, name } => {
                self.require_uncounted()?;
                if self.expansion.is_some() {
                    return Err(EnrichError::Pipeline(
                        "Must derive presence columns before expanding".to_string(),
                    ));
                }
                self.table = self.table.with_presence_column(source, name)?;
            }

            // === Expansion ===
            AnalysisStep::Expand { column, options } => {
                self.require_uncounted()?;
                let mut expansion = expand_multi_value(self.current(), column, options)?;
                if let Some(previous) = &self.expansion {
                    // map back to rows of the unexpanded table
                    for source in expansion.source_rows.iter_mut() {
                        *source = previous.source_rows[*source];
                    }
                }
                let summary = expansion.summary();
                info!(
                    "Expanded '{}': {} -> {} rows ({} missing, {} ambiguous)",
                    summary.column,
                    summary.n_source_rows,
                    summary.n_expanded_rows,
                    summary.n_missing,
                    summary.n_ambiguous
                );
                self.expansions.push(summary);
                self.expansion = Some(expansion);
            }

            // === Counting ===
            AnalysisStep::KeepCategories { categories } => {
                if self.counts.is_some() {
                    return Err(EnrichError::Pipeline(
                        "Must keep categories before counting".to_string(),
                    ));
                }
                self.allowed_categories = Some(categories.clone());
            }
            AnalysisStep::Count {
                category_column,
                classes,
            } => {
                let spec = CountSpec {
                    class_column: self.class_column.clone(),
                    category_column: category_column.clone(),
                    classes: classes.clone(),
                    categories: self.allowed_categories.clone(),
                };
                let counts = match &self.expansion {
                    Some(expansion) => count_expanded(expansion, &spec)?,
                    None => count_classes(&self.table, &spec)?,
                };
                debug!(
                    "Counted {} rows over {} categories x {} classes",
                    counts.n_counted(),
                    counts.categories().len(),
                    counts.classes().len()
                );
                self.spec = Some(spec);
                self.counts = Some(counts);
            }

            // === Scoring and Ranking ===
            AnalysisStep::Enrich { class_a, class_b } => {
                let counts = self.counts.as_ref().ok_or_else(|| {
                    EnrichError::Pipeline("Must count before enrichment".to_string())
                })?;
                self.enrichment.push(enrich_categories(counts, class_a, class_b)?);
            }
            AnalysisStep::TopCategories { metric, n } => {
                let counts = self.counts.as_ref().ok_or_else(|| {
                    EnrichError::Pipeline("Must count before ranking categories".to_string())
                })?;
                self.top_categories.push(CategoryRanking {
                    metric: metric.name(),
                    ranked: rank_categories(counts, metric, *n)?,
                });
            }
            AnalysisStep::EntityGrid {
                entity_column,
                n_categories,
                n_entities,
            } => {
                let spec = self.spec.as_ref().ok_or_else(|| {
                    EnrichError::Pipeline("Must count before building a grid".to_string())
                })?;
                let entity_counts = count_entities(self.current(), entity_column, spec)?;
                let volume = entity_counts.volume(None)?;
                let selection = select_grid(&volume, *n_categories, *n_entities);
                self.grids.push(GridReport {
                    entity_column: entity_column.clone(),
                    counts: selection.count_matrix(&volume)?,
                    shares: selection.share_matrix(&volume)?,
                    selection,
                });
            }
            AnalysisStep::TopEntitiesPerCategory {
                entity_column,
                class,
                k,
            } => {
                let spec = self.spec.as_ref().ok_or_else(|| {
                    EnrichError::Pipeline("Must count before ranking entities".to_string())
                })?;
                let entity_counts = count_entities(self.current(), entity_column, spec)?;
                let shares = class_shares(&entity_counts, class)?;
                self.top_entities.push(EntityTopReport {
                    entity_column: entity_column.clone(),
                    class: class.clone(),
                    categories: top_entities_per_category(&shares, *k),
                });
            }
        }
        Ok(self)
    }

    fn finalize(self, name: &str) -> AnalysisReport {
        let n_rows = self.current().n_rows();
        AnalysisReport {
            name: name.to_string(),
            class_column: self.class_column,
            policy: self.policy,
            n_input_rows: self.n_input_rows,
            n_rows,
            expansions: self.expansions,
            counts: self.counts.map(|c| c.long_form(self.policy)),
            enrichment: self.enrichment,
            top_categories: self.top_categories,
            grids: self.grids,
            top_entities: self.top_entities,
        }
    }
}

/// Convenience function for the common two-class category enrichment:
/// keep both classes, expand the category column, count, score and rank.
pub fn run_category_enrichment(
    table: &Table,
    class_column: &str,
    category_column: &str,
    class_a: &str,
    class_b: &str,
    n_top: usize,
) -> Result<AnalysisReport> {
    Analysis::new(class_column)
        .name("category-enrichment")
        .filter_classes(&[class_a, class_b])
        .expand(category_column)
        .count_classes(category_column, &[class_a, class_b])
        .enrich(class_a, class_b)
        .top_categories(
            Metric::Ratio {
                class_a: class_a.to_string(),
                class_b: class_b.to_string(),
            },
            n_top,
        )
        .run(table)
}
