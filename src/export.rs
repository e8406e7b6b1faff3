use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

use crate::data_models::{ResultRecord, SearchQuery};

/// One row of the flat results table.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ExportRow<'a> {
    pub title: &'a str,
    pub publication: &'a str,
    pub link: &'a str,
}

impl<'a> From<&'a ResultRecord> for ExportRow<'a> {
    fn from(record: &'a ResultRecord) -> Self {
        ExportRow {
            title: &record.title,
            publication: &record.publication,
            link: &record.link,
        }
    }
}

pub fn rows(records: &[ResultRecord]) -> Vec<ExportRow<'_>> {
    records.iter().map(ExportRow::from).collect()
}

/// Writes the records as a pretty printed JSON array of rows.
pub fn write_json<W: Write>(records: &[ResultRecord], mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, &rows(records))
        .context("Failed to serialize search results")?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

pub fn write_json_file(records: &[ResultRecord], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_json(records, std::io::BufWriter::new(file))
}

pub fn default_file_name(query: &SearchQuery) -> String {
    format!(
        "search_results_{}_{}.json",
        query.keyword(),
        query.language.code()
    )
}
