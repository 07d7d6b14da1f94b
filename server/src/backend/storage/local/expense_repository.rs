use anyhow::{anyhow, Result};
use csv::{ByteRecord, ReaderBuilder, WriterBuilder};
use serde::Deserialize;
use shared::Expense;
use std::fs::File;
use std::io::BufReader;
use tracing::{debug, warn};

use super::connection::{write_atomically, LocalConnection};
use crate::backend::domain::models::expense_from_parts;

const HEADER: [&str; 5] = ["id", "amount", "category", "description", "date"];

/// Raw CSV row; every field is validated before it becomes an [`Expense`]
#[derive(Debug, Deserialize)]
struct ExpenseRecord {
    id: String,
    amount: String,
    category: String,
    #[serde(default)]
    description: String,
    date: String,
}

impl ExpenseRecord {
    fn into_expense(self) -> Result<Expense> {
        let description = Some(self.description).filter(|d| !d.is_empty());
        Ok(expense_from_parts(self.id, &self.amount, &self.category, description, &self.date)?)
    }
}

/// A user's expense file exactly as stored.
///
/// Rows are kept as raw bytes so a rewrite never drops a row that fails
/// validation; only [`StoredExpenses::expenses`] filters them out.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredExpenses {
    headers: ByteRecord,
    rows: Vec<ByteRecord>,
}

impl Default for StoredExpenses {
    fn default() -> Self {
        Self {
            headers: ByteRecord::from(HEADER.to_vec()),
            rows: Vec::new(),
        }
    }
}

impl StoredExpenses {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Valid rows as expenses, in file order
    pub fn expenses(&self) -> Vec<Expense> {
        let mut expenses = Vec::with_capacity(self.rows.len());
        for (index, row) in self.rows.iter().enumerate() {
            let parsed = row
                .deserialize::<ExpenseRecord>(Some(&self.headers))
                .map_err(anyhow::Error::from)
                .and_then(ExpenseRecord::into_expense);
            match parsed {
                Ok(expense) => expenses.push(expense),
                Err(e) => warn!("Skipping invalid expense row {}: {}", index + 1, e),
            }
        }
        expenses
    }

    /// Append `expense` using the file's own column order
    pub fn push(&mut self, expense: &Expense) {
        let row: ByteRecord = self
            .headers
            .iter()
            .map(|column| column_value(expense, column))
            .collect();
        self.rows.push(row);
    }

    /// Remove every row whose id column is `expense_id`; false if none matched
    pub fn remove(&mut self, expense_id: &str) -> bool {
        let Some(id_column) = self.headers.iter().position(|column| column == b"id") else {
            return false;
        };
        let before = self.rows.len();
        self.rows
            .retain(|row| row.get(id_column) != Some(expense_id.as_bytes()));
        self.rows.len() != before
    }
}

fn column_value(expense: &Expense, column: &[u8]) -> String {
    match column {
        b"id" => expense.id.clone(),
        b"amount" => expense.amount.to_string(),
        b"category" => expense.category.as_str().to_string(),
        b"description" => expense.description.clone().unwrap_or_default(),
        b"date" => expense.date.format("%Y-%m-%d").to_string(),
        _ => String::new(),
    }
}

/// CSV-backed expense list, one file per user
#[derive(Clone)]
pub struct ExpenseRepository {
    connection: LocalConnection,
}

impl ExpenseRepository {
    pub fn new(connection: LocalConnection) -> Self {
        Self { connection }
    }

    /// Valid expenses in file order; invalid rows are logged and skipped
    pub fn read_expenses(&self, user_id: &str) -> Result<Vec<Expense>> {
        Ok(self.read_stored(user_id)?.expenses())
    }

    /// Every stored row, valid or not; a missing file means no rows
    pub fn read_stored(&self, user_id: &str) -> Result<StoredExpenses> {
        let file_path = self.connection.expenses_file_path(user_id)?;
        if !file_path.exists() {
            return Ok(StoredExpenses::default());
        }

        let file = File::open(&file_path)?;
        let mut csv_reader = ReaderBuilder::new()
            .flexible(true)
            .from_reader(BufReader::new(file));

        let headers = csv_reader.byte_headers()?.clone();
        let mut stored = if headers.is_empty() {
            StoredExpenses::default()
        } else {
            StoredExpenses {
                headers,
                rows: Vec::new(),
            }
        };
        for row in csv_reader.byte_records() {
            stored.rows.push(row?);
        }

        debug!("Read {} expense rows from {}", stored.len(), file_path.display());
        Ok(stored)
    }

    /// Replace a user's expense file with `stored`
    pub fn write_stored(&self, user_id: &str, stored: &StoredExpenses) -> Result<()> {
        self.connection.ensure_user_directory(user_id)?;
        let file_path = self.connection.expenses_file_path(user_id)?;

        let mut csv_writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
        csv_writer.write_byte_record(&stored.headers)?;
        for row in &stored.rows {
            csv_writer.write_byte_record(row)?;
        }
        let contents = csv_writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush CSV buffer: {}", e.error()))?;

        write_atomically(&file_path, &contents)?;
        debug!("Wrote {} expense rows to {}", stored.len(), file_path.display());
        Ok(())
    }
}
