//! Operator diagnostic query path.
//!
//! Runs one raw SQL statement against the live connection and reports the
//! affected/returned row count, the elapsed time and, for row-returning
//! statements, a psql-style text table. This bypasses every repository
//! invariant and is only reachable through the highest access level.

use log::{info, warn};
use rusqlite::types::ValueRef;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// Successful diagnostic statement.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryReport {
    pub row_count: usize,
    pub elapsed: Duration,
    /// Present only for statements that return rows.
    pub table: Option<String>,
}

impl QueryReport {
    /// Renders the operator-facing text block.
    pub fn render(&self) -> String {
        let mut output = format!(
            "Query OK, {} row(s) found/affected ({:.3}s)",
            self.row_count,
            self.elapsed.as_secs_f64()
        );
        if let Some(table) = &self.table {
            output.push_str("\n\n");
            output.push_str(table);
        }
        output
    }
}

/// Failed diagnostic statement with the time spent before it failed.
#[derive(Debug)]
pub struct QueryFailure {
    pub elapsed: Duration,
    pub error: rusqlite::Error,
}

impl QueryFailure {
    pub fn render(&self) -> String {
        format!(
            "Query failed ({:.3}s) with error:\n\n{}",
            self.elapsed.as_secs_f64(),
            self.error
        )
    }
}

impl Display for QueryFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

impl Error for QueryFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

/// Executes a single raw statement.
pub fn run_diagnostic_query(conn: &Connection, sql: &str) -> Result<QueryReport, QueryFailure> {
    let started_at = Instant::now();
    match execute_statement(conn, sql) {
        Ok((row_count, table)) => {
            let elapsed = started_at.elapsed();
            info!(
                "event=diagnostic_query module=db status=ok rows={row_count} duration_ms={}",
                elapsed.as_millis()
            );
            Ok(QueryReport {
                row_count,
                elapsed,
                table,
            })
        }
        Err(error) => {
            let elapsed = started_at.elapsed();
            warn!(
                "event=diagnostic_query module=db status=error duration_ms={} error={}",
                elapsed.as_millis(),
                error
            );
            Err(QueryFailure { elapsed, error })
        }
    }
}

fn execute_statement(conn: &Connection, sql: &str) -> rusqlite::Result<(usize, Option<String>)> {
    let mut stmt = conn.prepare(sql)?;
    if stmt.column_count() == 0 {
        let changed = stmt.execute([])?;
        return Ok((changed, None));
    }

    let headers: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();
    let width = headers.len();
    let mut rows: Vec<Vec<Cell>> = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut cells = Vec::with_capacity(width);
        for index in 0..width {
            cells.push(Cell::from_value(row.get_ref(index)?));
        }
        rows.push(cells);
    }

    let row_count = rows.len();
    Ok((row_count, Some(tabulate(&headers, &rows))))
}

#[derive(Debug, Clone)]
struct Cell {
    text: String,
    numeric: bool,
}

impl Cell {
    fn from_value(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Self {
                text: String::new(),
                numeric: false,
            },
            ValueRef::Integer(v) => Self {
                text: v.to_string(),
                numeric: true,
            },
            ValueRef::Real(v) => Self {
                text: v.to_string(),
                numeric: true,
            },
            ValueRef::Text(bytes) => Self {
                text: String::from_utf8_lossy(bytes).into_owned(),
                numeric: false,
            },
            ValueRef::Blob(bytes) => Self {
                text: format!("<{} bytes>", bytes.len()),
                numeric: false,
            },
        }
    }
}

fn tabulate(headers: &[String], rows: &[Vec<Cell>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    let mut numeric: Vec<bool> = vec![true; headers.len()];
    for row in rows {
        for (index, cell) in row.iter().enumerate() {
            widths[index] = widths[index].max(cell.text.chars().count());
            if !cell.text.is_empty() && !cell.numeric {
                numeric[index] = false;
            }
        }
    }
    if rows.is_empty() {
        numeric.iter_mut().for_each(|flag| *flag = false);
    }

    let rule = |edge: char, joint: char| {
        let inner: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
        format!("{edge}{}{edge}", inner.join(&joint.to_string()))
    };
    let line = |cells: Vec<(&str, bool)>| {
        let inner: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|((text, right), width)| {
                let width = *width;
                if *right {
                    format!(" {text:>width$} ")
                } else {
                    format!(" {text:<width$} ")
                }
            })
            .collect();
        format!("|{}|", inner.join("|"))
    };

    let mut lines = vec![rule('+', '+')];
    lines.push(line(headers.iter().map(|h| (h.as_str(), false)).collect()));
    lines.push(rule('|', '+'));
    for row in rows {
        lines.push(line(
            row.iter()
                .zip(&numeric)
                .map(|(cell, right)| (cell.text.as_str(), *right))
                .collect(),
        ));
    }
    lines.push(rule('+', '+'));
    lines.join("\n")
}
