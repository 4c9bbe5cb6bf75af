//! Inside/outside summaries of an annotation column per class.

use crate::data::{DivisionPolicy, Table};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Presence counts for one class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceRow {
    pub class: String,
    /// Rows of the class.
    pub total: u64,
    /// Rows where the annotation is present.
    pub present: u64,
    /// Rows where it is missing or false-like.
    pub absent: u64,
    /// `present / total`.
    pub fraction_present: f64,
}

/// How often an annotation column is present, split by class.
///
/// Answers questions such as "what share of oncogenic variants fall inside a
/// protein domain" or "how many are hotspots".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceSummary {
    pub class_column: String,
    pub column: String,
    pub rows: Vec<PresenceRow>,
}

impl PresenceSummary {
    /// Row for one class.
    pub fn get(&self, class: &str) -> Option<&PresenceRow> {
        self.rows.iter().find(|r| r.class == class)
    }

    /// Write to a TSV file.
    pub fn to_tsv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(writer, "class\ttotal\tpresent\tabsent\tfraction_present")?;
        for r in &self.rows {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{:.6}",
                r.class, r.total, r.present, r.absent, r.fraction_present
            )?;
        }

        writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Display for PresenceSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Presence of {} by {}", self.column, self.class_column)?;
        for r in &self.rows {
            writeln!(
                f,
                "  {:<24} {:>8} present / {:>8} ({:.1}%)",
                r.class,
                r.present,
                r.total,
                r.fraction_present * 100.0
            )?;
        }
        Ok(())
    }
}

/// Summarise presence of `column` for each class.
///
/// # Arguments
/// * `table` - Input table
/// * `class_column` - Column holding the class label
/// * `column` - Annotation column; present means non-missing, or truthy
///   when the column only holds boolean-like values (`true`/`false`, 0/1)
/// * `classes` - Classes to report, in order; `None` reports every observed
///   class in name order. A requested class with no rows gets a total of 0.
/// * `policy` - Value of `fraction_present` for empty classes
pub fn presence_summary(
    table: &Table,
    class_column: &str,
    column: &str,
    classes: Option<&[String]>,
    policy: DivisionPolicy,
) -> Result<PresenceSummary> {
    let class_col = table.column_index(class_column)?;
    let col = table.column_index(column)?;
    let is_present = table.presence_rule(column)?;

    // class -> (total, present)
    let mut tallies: HashMap<String, (u64, u64)> = HashMap::new();
    for record in table.records() {
        let values = record.values();
        let Some(class) = values[class_col].as_token() else {
            continue;
        };
        let entry = tallies.entry(class.into_owned()).or_default();
        entry.0 += 1;
        if is_present(&values[col]) {
            entry.1 += 1;
        }
    }

    let order: Vec<String> = match classes {
        Some(classes) => classes.to_vec(),
        None => tallies.keys().cloned().collect::<BTreeSet<_>>().into_iter().collect(),
    };

    let rows = order
        .into_iter()
        .map(|class| {
            let (total, present) = tallies.get(&class).copied().unwrap_or((0, 0));
            PresenceRow {
                class,
                total,
                present,
                absent: total - present,
                fraction_present: policy.divide(present, total),
            }
        })
        .collect();

    Ok(PresenceSummary {
        class_column: class_column.to_string(),
        column: column.to_string(),
        rows,
    })
}
