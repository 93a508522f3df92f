//! Parent/child correlation within a single session file.
//!
//! The index is built over the entries of one file and borrows them, so it cannot
//! outlive the file's processing. Lookups happen by identifier only; file order is
//! not assumed.

use crate::models::EntryKind;
use crate::parser::ProcessedEntry;
use std::collections::HashMap;

pub struct Correlator<'a> {
    by_id: HashMap<&'a str, &'a ProcessedEntry>,
}

impl<'a> Correlator<'a> {
    /// Index every entry carrying a non-empty identifier. A repeated identifier
    /// resolves to the last entry that carried it.
    pub fn build(entries: &'a [ProcessedEntry]) -> Self {
        let by_id = entries
            .iter()
            .filter_map(|processed| processed.entry.id().map(|id| (id, processed)))
            .collect();
        Self { by_id }
    }

    pub fn get(&self, id: &str) -> Option<&'a ProcessedEntry> {
        self.by_id.get(id).copied()
    }

    pub fn parent_of(&self, child: &ProcessedEntry) -> Option<&'a ProcessedEntry> {
        child.entry.parent_id().and_then(|id| self.get(id))
    }

    /// The user turn an assistant reply answers, if its parent is one.
    pub fn user_parent_of(&self, child: &ProcessedEntry) -> Option<&'a ProcessedEntry> {
        self.parent_of(child)
            .filter(|parent| parent.entry.kind == EntryKind::User)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LogEntry;

    fn processed(line: &str, line_number: usize) -> ProcessedEntry {
        let entry: LogEntry = serde_json::from_str(line).unwrap();
        ProcessedEntry::new(entry, line_number).unwrap()
    }

    #[test]
    fn test_resolves_parent_regardless_of_order() {
        // Child listed before its parent.
        let entries = vec![
            processed(
                r#"{"uuid":"a1","parentUuid":"u1","type":"assistant","timestamp":"2025-06-13T14:30:05Z"}"#,
                1,
            ),
            processed(
                r#"{"uuid":"u1","type":"user","timestamp":"2025-06-13T14:30:00Z"}"#,
                2,
            ),
        ];
        let correlator = Correlator::build(&entries);

        let parent = correlator.user_parent_of(&entries[0]).unwrap();
        assert_eq!(parent.entry.id(), Some("u1"));
        assert!(correlator.get("a1").is_some());
    }

    #[test]
    fn test_entries_without_id_are_not_indexed() {
        let entries = vec![
            processed(r#"{"type":"user","timestamp":"2025-06-13T14:30:00Z"}"#, 1),
            processed(r#"{"uuid":"","type":"user","timestamp":"2025-06-13T14:30:00Z"}"#, 2),
        ];
        let correlator = Correlator::build(&entries);
        assert!(correlator.get("").is_none());
        assert!(entries.iter().all(|e| correlator.parent_of(e).is_none()));
    }

    #[test]
    fn test_non_user_parent_is_ignored() {
        let entries = vec![
            processed(
                r#"{"uuid":"a0","type":"assistant","timestamp":"2025-06-13T14:30:00Z"}"#,
                1,
            ),
            processed(
                r#"{"uuid":"a1","parentUuid":"a0","type":"assistant","timestamp":"2025-06-13T14:30:05Z"}"#,
                2,
            ),
        ];
        let correlator = Correlator::build(&entries);

        assert!(correlator.parent_of(&entries[1]).is_some());
        assert!(correlator.user_parent_of(&entries[1]).is_none());
    }

    #[test]
    fn test_dangling_parent() {
        let entries = vec![processed(
            r#"{"uuid":"a1","parentUuid":"missing","type":"assistant","timestamp":"2025-06-13T14:30:05Z"}"#,
            1,
        )];
        assert!(Correlator::build(&entries).parent_of(&entries[0]).is_none());
    }
}
