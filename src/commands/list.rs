use std::io::Write;

use crate::format;
use adls_meta_core::{FileTable, FormInputs, NO_FILES_MESSAGE, Outcome, Pipeline, Result};
use clap::{Args, ValueEnum};
use serde::Serialize;
use tabled::settings::{Alignment, Color, Format, Modify, Style, object::Columns, object::Rows};
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Args)]
#[command(visible_aliases = ["ls"])]
pub struct ListCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Omit the file count and total size line
    #[arg(long)]
    pub no_summary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Tabled)]
struct FileRow {
    #[tabled(rename = "File Name")]
    name: String,
    #[tabled(rename = "Size (Bytes)")]
    size: u64,
    #[tabled(rename = "Last Modified")]
    last_modified: String,
}

#[derive(Debug, Serialize)]
struct JsonRow<'a> {
    name: &'a str,
    size: u64,
    last_modified: Option<String>,
}

impl ListCommand {
    pub async fn run(&self, inputs: FormInputs) -> Result<()> {
        tracing::debug!("Listing files for {:?}", inputs);

        let outcome = Pipeline::azure().run(&inputs).await;

        let mut stdout = std::io::stdout().lock();
        self.render(&outcome, &mut stdout)?;

        match outcome.into_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Write the table (or the no-files message) for `outcome`
    fn render(&self, outcome: &Outcome, out: &mut impl Write) -> Result<()> {
        let Some(table) = outcome.table() else {
            return Ok(());
        };

        match self.format {
            OutputFormat::Json => {
                self.write_json(table, out)?;
                if table.is_empty() {
                    eprintln!("{}", NO_FILES_MESSAGE);
                }
            }
            OutputFormat::Table if table.is_empty() => {
                writeln!(out, "{}", NO_FILES_MESSAGE)?;
            }
            OutputFormat::Table => {
                self.write_table(table, out)?;
                if !self.no_summary {
                    writeln!(
                        out,
                        "\n{} file{}, {} bytes",
                        table.len(),
                        if table.len() == 1 { "" } else { "s" },
                        table.total_size()
                    )?;
                }
            }
        }

        Ok(())
    }

    fn write_json(&self, table: &FileTable, out: &mut impl Write) -> Result<()> {
        let rows: Vec<JsonRow> = table
            .rows()
            .iter()
            .map(|r| JsonRow {
                name: &r.name,
                size: r.size,
                last_modified: r.last_modified.map(|dt| dt.to_rfc3339()),
            })
            .collect();

        serde_json::to_writer_pretty(&mut *out, &rows)?;
        writeln!(out)?;
        Ok(())
    }

    fn write_table(&self, table: &FileTable, out: &mut impl Write) -> Result<()> {
        let rows = table.rows().iter().map(|r| FileRow {
            name: r.name.clone(),
            size: r.size,
            last_modified: format::timestamp(r.last_modified),
        });

        let mut rendered = Table::new(rows);
        rendered.with(Style::rounded());
        rendered.with(Modify::new(Columns::new(1..2)).with(Alignment::right()));

        // Apply colors only if enabled
        if console::colors_enabled() {
            rendered.with(
                Modify::new(Rows::first())
                    .with(Color::FG_BRIGHT_BLUE)
                    .with(Format::content(|s| format!("\x1b[1m{}\x1b[0m", s))),
            );
        }

        writeln!(out, "{}", rendered)?;
        Ok(())
    }
}
