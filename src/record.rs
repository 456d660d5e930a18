// 🧾 Record Store - petty cash rows
// One scratch "input" row for entry plus the committed rows shown in the list.
// Rows live for the session only; nothing here is persisted.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ============================================================================
// STATUS FLAG
// ============================================================================

/// Deficit (結欠, resident owes money) or Balance (結餘, money left over)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFlag {
    Deficit,
    #[default]
    Balance,
}

impl StatusFlag {
    /// Label used in messages and on the toggle button
    pub fn label(&self) -> &'static str {
        match self {
            StatusFlag::Deficit => "結欠",
            StatusFlag::Balance => "結餘",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            StatusFlag::Deficit => StatusFlag::Balance,
            StatusFlag::Balance => StatusFlag::Deficit,
        }
    }

    pub fn is_deficit(&self) -> bool {
        matches!(self, StatusFlag::Deficit)
    }

    /// Accepts the English names and the Chinese labels
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "deficit" | "結欠" => Some(StatusFlag::Deficit),
            "balance" | "結餘" | "" => Some(StatusFlag::Balance),
            _ => None,
        }
    }
}

// ============================================================================
// RECORD
// ============================================================================

/// Stable row identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(uuid::Uuid);

impl RecordId {
    pub fn new() -> Self {
        RecordId(uuid::Uuid::new_v4())
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    Input,
    Committed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub kind: RecordKind,
    pub name: String,
    /// Free-form, normally `YYYY-MM-DD` from a date picker
    pub date: String,
    pub status: StatusFlag,
    /// Decimal kept as typed; empty means "not entered"
    pub amount: String,
}

impl Record {
    fn blank_input() -> Self {
        Record {
            id: RecordId::new(),
            kind: RecordKind::Input,
            name: String::new(),
            date: String::new(),
            status: StatusFlag::Balance,
            amount: String::new(),
        }
    }

    pub fn is_input(&self) -> bool {
        self.kind == RecordKind::Input
    }

    /// Name and date both present (after trimming)
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.date.trim().is_empty()
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("請輸入院友名字。")]
    EmptyName,
    #[error("請輸入截至日期。")]
    EmptyDate,
}

// ============================================================================
// RECORD STORE
// ============================================================================

#[derive(Debug, Clone)]
pub struct RecordStore {
    input: Record,
    committed: Vec<Record>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    pub fn new() -> Self {
        RecordStore {
            input: Record::blank_input(),
            committed: Vec::new(),
        }
    }

    pub fn input(&self) -> &Record {
        &self.input
    }

    /// Committed rows in commit order
    pub fn committed(&self) -> &[Record] {
        &self.committed
    }

    pub fn get(&self, id: RecordId) -> Option<&Record> {
        if self.input.id == id {
            return Some(&self.input);
        }
        self.committed.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    // ------------------------------------------------------------------------
    // Input row editing
    // ------------------------------------------------------------------------

    pub fn set_input_name(&mut self, name: impl Into<String>) {
        self.input.name = name.into();
    }

    pub fn set_input_date(&mut self, date: impl Into<String>) {
        self.input.date = date.into();
    }

    pub fn set_input_amount(&mut self, amount: impl Into<String>) {
        self.input.amount = amount.into();
    }

    pub fn set_input_status(&mut self, status: StatusFlag) {
        self.input.status = status;
    }

    // ------------------------------------------------------------------------
    // Contract operations
    // ------------------------------------------------------------------------

    /// Promote the input row to a committed row.
    ///
    /// Name is checked before date. On success the input row keeps its date
    /// so consecutive entries share it; name and amount are cleared and the
    /// flag returns to Balance.
    pub fn commit_input(&mut self) -> Result<RecordId, ValidationError> {
        let name = self.input.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let date = self.input.date.trim();
        if date.is_empty() {
            return Err(ValidationError::EmptyDate);
        }

        let committed = Record {
            id: RecordId::new(),
            kind: RecordKind::Committed,
            name: name.to_string(),
            date: date.to_string(),
            status: self.input.status,
            amount: self.input.amount.trim().to_string(),
        };
        let id = committed.id;
        tracing::debug!(%id, name = %committed.name, status = committed.status.label(), "record committed");
        self.committed.push(committed);

        self.input.name.clear();
        self.input.amount.clear();
        self.input.status = StatusFlag::Balance;

        Ok(id)
    }

    /// Remove a committed row. The input row and unknown ids are ignored.
    pub fn delete_record(&mut self, id: RecordId) {
        if id == self.input.id {
            tracing::debug!(%id, "refusing to delete the input row");
            return;
        }
        let before = self.committed.len();
        self.committed.retain(|r| r.id != id);
        if self.committed.len() != before {
            tracing::debug!(%id, "record deleted");
        }
    }

    /// Flip Deficit ⇄ Balance on the input row or any committed row
    pub fn toggle_status(&mut self, id: RecordId) {
        let record = if id == self.input.id {
            Some(&mut self.input)
        } else {
            self.committed.iter_mut().find(|r| r.id == id)
        };
        if let Some(record) = record {
            record.status = record.status.toggled();
        }
    }

    /// Drop every committed row and blank the input row (date included).
    /// Asking the user for confirmation is the caller's job.
    pub fn clear_all(&mut self) {
        tracing::debug!(count = self.committed.len(), "clearing all records");
        self.committed.clear();
        let id = self.input.id;
        self.input = Record {
            id,
            ..Record::blank_input()
        };
    }

    /// Trimmed names present on any row, optionally skipping one row
    /// (the one currently being typed into).
    pub fn used_names(&self, except: Option<RecordId>) -> HashSet<String> {
        std::iter::once(&self.input)
            .chain(self.committed.iter())
            .filter(|r| Some(r.id) != except)
            .map(|r| r.name.trim())
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_input(store: &mut RecordStore, name: &str, date: &str, status: StatusFlag, amount: &str) {
        store.set_input_name(name);
        store.set_input_date(date);
        store.set_input_status(status);
        store.set_input_amount(amount);
    }

    #[test]
    fn test_commit_requires_name_first() {
        let mut store = RecordStore::new();
        assert_eq!(store.commit_input(), Err(ValidationError::EmptyName));

        store.set_input_name("   ");
        store.set_input_date("2024-01-01");
        assert_eq!(store.commit_input(), Err(ValidationError::EmptyName));
        assert!(store.is_empty());
    }

    #[test]
    fn test_commit_requires_date() {
        let mut store = RecordStore::new();
        store.set_input_name("陳大文");
        assert_eq!(store.commit_input(), Err(ValidationError::EmptyDate));
        assert!(store.is_empty());
        // Nothing was reset
        assert_eq!(store.input().name, "陳大文");
    }

    #[test]
    fn test_commit_appends_and_resets_input() {
        let mut store = RecordStore::new();
        fill_input(&mut store, "陳大文", "2024-01-01", StatusFlag::Deficit, "50");

        let id = store.commit_input().unwrap();

        assert_eq!(store.len(), 1);
        let record = store.get(id).unwrap();
        assert_eq!(record.kind, RecordKind::Committed);
        assert_eq!(record.name, "陳大文");
        assert_eq!(record.date, "2024-01-01");
        assert_eq!(record.status, StatusFlag::Deficit);
        assert_eq!(record.amount, "50");

        let input = store.input();
        assert!(input.name.is_empty());
        assert!(input.amount.is_empty());
        assert_eq!(input.date, "2024-01-01");
        assert_eq!(input.status, StatusFlag::Balance);
    }

    #[test]
    fn test_commit_order_is_preserved() {
        let mut store = RecordStore::new();
        store.set_input_date("2024-01-01");
        for name in ["A", "B", "C"] {
            store.set_input_name(name);
            store.commit_input().unwrap();
        }
        let names: Vec<_> = store.committed().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_delete_ignores_input_and_unknown_ids() {
        let mut store = RecordStore::new();
        fill_input(&mut store, "A", "2024-01-01", StatusFlag::Balance, "");
        let a = store.commit_input().unwrap();

        store.delete_record(store.input().id);
        store.delete_record(RecordId::new());
        assert_eq!(store.len(), 1);

        store.delete_record(a);
        assert!(store.is_empty());
    }

    #[test]
    fn test_toggle_status_on_input_and_committed() {
        let mut store = RecordStore::new();
        let input_id = store.input().id;
        store.toggle_status(input_id);
        assert_eq!(store.input().status, StatusFlag::Deficit);

        fill_input(&mut store, "A", "2024-01-01", StatusFlag::Deficit, "1");
        let a = store.commit_input().unwrap();
        store.toggle_status(a);
        assert_eq!(store.get(a).unwrap().status, StatusFlag::Balance);
        store.toggle_status(a);
        assert_eq!(store.get(a).unwrap().status, StatusFlag::Deficit);
    }

    #[test]
    fn test_clear_all_resets_everything() {
        let mut store = RecordStore::new();
        fill_input(&mut store, "A", "2024-01-01", StatusFlag::Deficit, "1");
        store.commit_input().unwrap();
        fill_input(&mut store, "B", "2024-02-01", StatusFlag::Deficit, "2");
        let input_id = store.input().id;

        store.clear_all();

        assert!(store.is_empty());
        let input = store.input();
        assert_eq!(input.id, input_id);
        assert!(input.name.is_empty() && input.date.is_empty() && input.amount.is_empty());
        assert_eq!(input.status, StatusFlag::Balance);
    }

    #[test]
    fn test_used_names_skips_excluded_row() {
        let mut store = RecordStore::new();
        fill_input(&mut store, "A", "2024-01-01", StatusFlag::Balance, "");
        store.commit_input().unwrap();
        store.set_input_name("B ");

        let all = store.used_names(None);
        assert!(all.contains("A") && all.contains("B"));

        let without_input = store.used_names(Some(store.input().id));
        assert!(without_input.contains("A"));
        assert!(!without_input.contains("B"));
    }

    #[test]
    fn test_status_flag_parse() {
        assert_eq!(StatusFlag::parse("Deficit"), Some(StatusFlag::Deficit));
        assert_eq!(StatusFlag::parse("結欠"), Some(StatusFlag::Deficit));
        assert_eq!(StatusFlag::parse("結餘"), Some(StatusFlag::Balance));
        assert_eq!(StatusFlag::parse(""), Some(StatusFlag::Balance));
        assert_eq!(StatusFlag::parse("owing"), None);
    }
}
