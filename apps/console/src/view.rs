//! Terminal rendering of the console surfaces.

use std::{
    fmt::Write as _,
    fs,
    path::PathBuf,
    sync::{Mutex, PoisonError},
};

use client_core::{Affordance, AffordanceState, BannerId, InteractionView, ZoneId};
use shared::{domain::TableDescriptor, protocol::QueryResult};
use tracing::{debug, error, info};

pub struct ConsoleView {
    query_text: Mutex<String>,
    last_results: Mutex<Option<String>>,
    assume_yes: bool,
    download_dir: PathBuf,
}

impl ConsoleView {
    pub fn new(assume_yes: bool, download_dir: PathBuf) -> Self {
        Self {
            query_text: Mutex::new(String::new()),
            last_results: Mutex::new(None),
            assume_yes,
            download_dir,
        }
    }
}

fn format_results(query: &str, result: &QueryResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "» {query}");
    let _ = writeln!(out, "  sql: {}", result.sql);
    if result.is_empty() {
        let _ = writeln!(out, "  (no rows)");
    } else {
        let _ = writeln!(out, "  {}", result.columns.join("\t"));
        for row in &result.rows {
            let cells: Vec<String> = result
                .columns
                .iter()
                .map(|column| match row.get(column) {
                    Some(value) if value.is_string() => {
                        value.as_str().unwrap_or_default().to_string()
                    }
                    Some(value) => value.to_string(),
                    None => String::new(),
                })
                .collect();
            let _ = writeln!(out, "  {}", cells.join("\t"));
        }
    }
    let _ = write!(
        out,
        "  {} row(s) in {:.2} ms",
        result.rows.len(),
        result.execution_time_ms
    );
    out
}

fn format_tables(tables: &[TableDescriptor]) -> String {
    if tables.is_empty() {
        return "No tables yet. Upload a file to get started.".to_string();
    }
    let mut out = String::from("tables:");
    for table in tables {
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|c| format!("{} {}", c.name, c.column_type))
            .collect();
        let _ = write!(
            out,
            "\n  {} ({} rows): {}",
            table.name,
            table.row_count,
            columns.join(", ")
        );
    }
    out
}

impl InteractionView for ConsoleView {
    fn set_affordance(&self, affordance: &Affordance, state: AffordanceState) {
        debug!(?affordance, ?state, "control state");
    }

    fn query_text(&self) -> String {
        self.query_text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_query_text(&self, text: &str) {
        *self.query_text.lock().unwrap_or_else(PoisonError::into_inner) = text.to_string();
        if !text.is_empty() {
            println!("query input: {text}");
        }
    }

    fn focus_query_input(&self) {
        debug!("query input focused");
    }

    fn show_drop_overlay(&self, zone: &ZoneId) {
        println!("[{zone}] drop your file here");
    }

    fn hide_drop_overlay(&self, zone: &ZoneId) {
        debug!(%zone, "drop overlay hidden");
    }

    fn render_results(&self, query: &str, result: &QueryResult) {
        let rendered = format_results(query, result);
        println!("{rendered}");
        *self.last_results.lock().unwrap_or_else(PoisonError::into_inner) = Some(rendered);
    }

    fn set_results_visible(&self, visible: bool) {
        if !visible {
            println!("(results hidden)");
            return;
        }
        match self
            .last_results
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
        {
            Some(rendered) => println!("{rendered}"),
            None => println!("(no results yet)"),
        }
    }

    fn render_tables(&self, tables: &[TableDescriptor]) {
        println!("{}", format_tables(tables));
    }

    fn show_error(&self, message: &str) {
        eprintln!("error: {message}");
    }

    fn show_success(&self, banner: BannerId, message: &str) {
        debug!(banner = banner.0, "banner shown");
        println!("ok: {message}");
    }

    fn dismiss_success(&self, banner: BannerId) {
        debug!(banner = banner.0, "banner dismissed");
    }

    fn close_upload_dialog(&self) {
        debug!("upload dialog closed");
    }

    fn confirm(&self, prompt: &str) -> bool {
        let answer = if self.assume_yes { "y" } else { "N" };
        println!("{prompt} [y/N] {answer}");
        if !self.assume_yes {
            println!("(start with --assume-yes to confirm destructive actions)");
        }
        self.assume_yes
    }

    fn deliver_download(&self, file_name: &str, bytes: &[u8]) {
        let path = self.download_dir.join(file_name);
        match fs::write(&path, bytes) {
            Ok(()) => {
                info!(path = %path.display(), bytes = bytes.len(), "download saved");
                println!("saved {}", path.display());
            }
            Err(err) => {
                error!(path = %path.display(), "failed to save download: {err}");
                eprintln!("error: could not save {}: {err}", path.display());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{ColumnDescriptor, TableName};

    #[test]
    fn results_render_cells_in_column_order() {
        let mut row = shared::protocol::Row::new();
        row.insert("name".to_string(), "ada".into());
        row.insert("id".to_string(), 1.into());
        let result = QueryResult {
            sql: "SELECT id, name FROM users".to_string(),
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![row],
            execution_time_ms: 1.234,
        };

        let rendered = format_results("who is there", &result);
        assert_eq!(
            rendered,
            "» who is there\n  sql: SELECT id, name FROM users\n  id\tname\n  1\tada\n  1 row(s) in 1.23 ms"
        );
    }

    #[test]
    fn empty_table_list_shows_placeholder() {
        assert_eq!(
            format_tables(&[]),
            "No tables yet. Upload a file to get started."
        );
        let listed = format_tables(&[TableDescriptor {
            name: TableName::new("users"),
            row_count: 3,
            columns: vec![ColumnDescriptor {
                name: "id".to_string(),
                column_type: "INTEGER".to_string(),
            }],
        }]);
        assert_eq!(listed, "tables:\n  users (3 rows): id INTEGER");
    }

    #[test]
    fn query_text_round_trips_through_the_view() {
        let view = ConsoleView::new(false, PathBuf::from("."));
        view.set_query_text("top customers");
        assert_eq!(view.query_text(), "top customers");
        assert!(!view.confirm("Remove?"));
    }
}
