// 🔍 Status Filter - all / 結欠 / 結餘
// View-only: never touches record data.

use crate::record::{Record, StatusFlag};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterState {
    #[default]
    All,
    /// Deficit rows only
    Flagged,
    /// Balance rows only
    Unflagged,
}

impl FilterState {
    pub fn label(&self) -> &'static str {
        match self {
            FilterState::All => "全部",
            FilterState::Flagged => StatusFlag::Deficit.label(),
            FilterState::Unflagged => StatusFlag::Balance.label(),
        }
    }

    /// Cycle All → Flagged → Unflagged → All
    pub fn next(&self) -> Self {
        match self {
            FilterState::All => FilterState::Flagged,
            FilterState::Flagged => FilterState::Unflagged,
            FilterState::Unflagged => FilterState::All,
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_lowercase().as_str() {
            "all" | "全部" => Some(FilterState::All),
            "deficit" | "flagged" | "結欠" => Some(FilterState::Flagged),
            "balance" | "unflagged" | "結餘" => Some(FilterState::Unflagged),
            _ => None,
        }
    }
}

/// The input row is always shown; committed rows follow the filter
pub fn is_visible(record: &Record, filter: FilterState) -> bool {
    if record.is_input() {
        return true;
    }
    match filter {
        FilterState::All => true,
        FilterState::Flagged => record.status == StatusFlag::Deficit,
        FilterState::Unflagged => record.status == StatusFlag::Balance,
    }
}

/// Committed rows visible under `filter`, in list order
pub fn visible<'a>(records: &'a [Record], filter: FilterState) -> Vec<&'a Record> {
    records.iter().filter(|r| is_visible(r, filter)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordStore;

    fn store_with(statuses: &[StatusFlag]) -> RecordStore {
        let mut store = RecordStore::new();
        store.set_input_date("2024-01-01");
        for (i, status) in statuses.iter().enumerate() {
            store.set_input_name(format!("R{}", i));
            store.set_input_status(*status);
            store.commit_input().unwrap();
        }
        store
    }

    #[test]
    fn test_input_row_always_visible() {
        let mut store = RecordStore::new();
        store.set_input_status(StatusFlag::Deficit);
        for filter in [FilterState::All, FilterState::Flagged, FilterState::Unflagged] {
            assert!(is_visible(store.input(), filter));
        }
    }

    #[test]
    fn test_partition_law() {
        use StatusFlag::*;
        let store = store_with(&[Deficit, Balance, Balance, Deficit, Balance]);
        let all = visible(store.committed(), FilterState::All);
        let flagged = visible(store.committed(), FilterState::Flagged);
        let unflagged = visible(store.committed(), FilterState::Unflagged);

        assert_eq!(all.len(), 5);
        assert_eq!(flagged.len() + unflagged.len(), all.len());
        for r in &flagged {
            assert!(!unflagged.iter().any(|u| u.id == r.id));
        }
        for r in &all {
            assert!(flagged.iter().chain(unflagged.iter()).any(|v| v.id == r.id));
        }
    }

    #[test]
    fn test_filter_follows_toggle() {
        let mut store = store_with(&[StatusFlag::Balance]);
        let id = store.committed()[0].id;
        assert!(visible(store.committed(), FilterState::Flagged).is_empty());

        store.toggle_status(id);
        assert_eq!(visible(store.committed(), FilterState::Flagged).len(), 1);
    }

    #[test]
    fn test_parse_and_cycle() {
        assert_eq!(FilterState::parse("deficit"), Some(FilterState::Flagged));
        assert_eq!(FilterState::parse("結餘"), Some(FilterState::Unflagged));
        assert_eq!(FilterState::parse("?"), None);
        assert_eq!(FilterState::All.next().next().next(), FilterState::All);
        assert_eq!(FilterState::default(), FilterState::All);
    }
}
