// 📱 Contact Collector - prefix + name + number → .vcf
// Memory only, never persisted: the list is gone when the session ends.

use crate::vcard;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Contact {
    /// Group code typed before the name, e.g. "HHBU"
    pub prefix: String,
    pub name: String,
    pub number: String,
}

impl Contact {
    /// Trimmed copy of the three fields
    pub fn new(prefix: &str, name: &str, number: &str) -> Self {
        Contact {
            prefix: prefix.trim().to_string(),
            name: name.trim().to_string(),
            number: number.trim().to_string(),
        }
    }

    fn is_blank(&self) -> bool {
        self.prefix.is_empty() && self.name.is_empty() && self.number.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContactError {
    #[error("請只輸入數字（Number 欄位僅接受數字，可選開頭 + 號）。Please enter numbers only (optional leading +).")]
    InvalidNumberFormat,
    #[error("no contact at position {0}")]
    NoSuchContact(usize),
}

/// Digits only, optionally one leading `+`. Empty is allowed.
pub fn is_valid_number(number: &str) -> bool {
    if number.is_empty() {
        return true;
    }
    let digits = number.strip_prefix('+').unwrap_or(number);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// The form was editing an existing entry and replaced it
    Updated,
    /// All three fields were empty
    Ignored,
}

/// A finished export ready to be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VcfExport {
    pub file_name: String,
    pub content: String,
    pub count: usize,
}

impl VcfExport {
    pub fn write_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.content)?;
        tracing::info!(path = %path.display(), contacts = self.count, "vcf written");
        Ok(path)
    }
}

/// `contacts-YYYY-MM-DD.vcf`
pub fn export_file_name(date: NaiveDate) -> String {
    format!("contacts-{}.vcf", date.format("%Y-%m-%d"))
}

// ============================================================================
// COLLECTOR
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ContactCollector {
    contacts: Vec<Contact>,
}

impl ContactCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Validate and append. A bad number leaves the list untouched.
    pub fn add_contact(&mut self, prefix: &str, name: &str, number: &str) -> Result<AddOutcome, ContactError> {
        let contact = Contact::new(prefix, name, number);
        if contact.is_blank() {
            return Ok(AddOutcome::Ignored);
        }
        if !is_valid_number(&contact.number) {
            return Err(ContactError::InvalidNumberFormat);
        }
        tracing::debug!(prefix = %contact.prefix, name = %contact.name, "contact added");
        self.contacts.push(contact);
        Ok(AddOutcome::Added)
    }

    /// Replace an existing entry, same number rule as adding
    pub fn edit_contact(
        &mut self,
        index: usize,
        prefix: &str,
        name: &str,
        number: &str,
    ) -> Result<(), ContactError> {
        let contact = Contact::new(prefix, name, number);
        if !is_valid_number(&contact.number) {
            return Err(ContactError::InvalidNumberFormat);
        }
        let slot = self
            .contacts
            .get_mut(index)
            .ok_or(ContactError::NoSuchContact(index))?;
        *slot = contact;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Option<Contact> {
        (index < self.contacts.len()).then(|| self.contacts.remove(index))
    }

    pub fn reset(&mut self) {
        self.contacts.clear();
    }

    /// Serialize every contact. `None` when the list is empty.
    /// The list is left as is; see `export_to`.
    pub fn export_all(&self, today: NaiveDate) -> Option<VcfExport> {
        if self.contacts.is_empty() {
            return None;
        }
        Some(VcfExport {
            file_name: export_file_name(today),
            content: vcard::cards(&self.contacts),
            count: self.contacts.len(),
        })
    }

    /// Write the `.vcf` into `dir`, clearing the list only once the file is
    /// on disk. A failed write keeps every contact.
    pub fn export_to(&mut self, dir: &Path, today: NaiveDate) -> std::io::Result<Option<VcfExport>> {
        let Some(export) = self.export_all(today) else {
            return Ok(None);
        };
        export.write_to(dir)?;
        tracing::info!(count = export.count, file = %export.file_name, "contacts exported");
        self.contacts.clear();
        Ok(Some(export))
    }
}

// ============================================================================
// ENTRY FORM
// ============================================================================

/// The three input boxes above the list, with the prefix lock
#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub prefix: String,
    pub name: String,
    pub number: String,
    /// Keep the prefix after adding, for typing a batch from one group
    pub prefix_locked: bool,
    /// Position of the entry being edited, if any
    pub editing: Option<usize>,
}

impl ContactForm {
    pub fn toggle_prefix_lock(&mut self) {
        self.prefix_locked = !self.prefix_locked;
    }

    pub fn lock_label(&self) -> &'static str {
        if self.prefix_locked { "已鎖定" } else { "鎖定" }
    }

    /// Inline validity hint for the number box
    pub fn number_is_invalid(&self) -> bool {
        let number = self.number.trim();
        !number.is_empty() && !is_valid_number(number)
    }

    /// Load an existing entry into the boxes; the next submit replaces it
    pub fn begin_edit(&mut self, index: usize, contact: &Contact) {
        self.prefix = contact.prefix.clone();
        self.name = contact.name.clone();
        self.number = contact.number.clone();
        self.editing = Some(index);
    }

    pub fn cancel_edit(&mut self) {
        if self.editing.take().is_some() {
            self.prefix.clear();
            self.name.clear();
            self.number.clear();
        }
    }

    /// Add (or save the edited entry); fields are cleared only on success
    pub fn submit(&mut self, collector: &mut ContactCollector) -> Result<AddOutcome, ContactError> {
        let outcome = match self.editing {
            Some(index) => {
                collector.edit_contact(index, &self.prefix, &self.name, &self.number)?;
                self.editing = None;
                AddOutcome::Updated
            }
            None => collector.add_contact(&self.prefix, &self.name, &self.number)?,
        };
        if outcome != AddOutcome::Ignored {
            if !self.prefix_locked {
                self.prefix.clear();
            }
            self.name.clear();
            self.number.clear();
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_number_validation() {
        assert!(is_valid_number(""));
        assert!(is_valid_number("12345"));
        assert!(is_valid_number("+85212345678"));
        assert!(!is_valid_number("+"));
        assert!(!is_valid_number("12a34"));
        assert!(!is_valid_number("++852"));
        assert!(!is_valid_number("852 1234"));
        assert!(!is_valid_number("１２３"));
    }

    #[test]
    fn test_add_and_export_scenario() {
        let mut collector = ContactCollector::new();
        assert_eq!(
            collector.add_contact("HHBU", "Peter", "+85212345678"),
            Ok(AddOutcome::Added)
        );

        let export = collector.export_all(day()).unwrap();
        assert_eq!(export.file_name, "contacts-2024-03-09.vcf");
        assert_eq!(export.count, 1);
        assert_eq!(vcard::field(&export.content, "FN"), Some("HHBUPeter"));
        assert_eq!(vcard::field(&export.content, "TEL;TYPE=CELL"), Some("+85212345678"));
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_invalid_number_rejected_without_mutation() {
        let mut collector = ContactCollector::new();
        collector.add_contact("A", "B", "1").unwrap();
        assert_eq!(
            collector.add_contact("HHBU", "Peter", "12a34"),
            Err(ContactError::InvalidNumberFormat)
        );
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_blank_submission_ignored() {
        let mut collector = ContactCollector::new();
        assert_eq!(collector.add_contact("  ", "", " "), Ok(AddOutcome::Ignored));
        assert!(collector.is_empty());
    }

    #[test]
    fn test_fields_are_trimmed() {
        let mut collector = ContactCollector::new();
        collector.add_contact(" HHBU ", " Peter", " 123 ").unwrap();
        assert_eq!(collector.contacts()[0], Contact::new("HHBU", "Peter", "123"));
        assert_eq!(collector.contacts()[0].number, "123");
    }

    #[test]
    fn test_export_empty_list_does_nothing() {
        let mut collector = ContactCollector::new();
        assert_eq!(collector.export_all(day()), None);
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(collector.export_to(dir.path(), day()).unwrap(), None);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_edit_remove_reset() {
        let mut collector = ContactCollector::new();
        collector.add_contact("A", "One", "1").unwrap();
        collector.add_contact("B", "Two", "2").unwrap();

        assert_eq!(
            collector.edit_contact(0, "A", "One", "x"),
            Err(ContactError::InvalidNumberFormat)
        );
        collector.edit_contact(0, "C", "Three", "3").unwrap();
        assert_eq!(collector.contacts()[0].prefix, "C");
        assert_eq!(
            collector.edit_contact(5, "", "", ""),
            Err(ContactError::NoSuchContact(5))
        );

        assert_eq!(collector.remove(1).map(|c| c.name), Some("Two".to_string()));
        assert_eq!(collector.remove(4), None);
        assert_eq!(collector.len(), 1);

        collector.reset();
        assert!(collector.is_empty());
    }

    #[test]
    fn test_form_prefix_lock() {
        let mut collector = ContactCollector::new();
        let mut form = ContactForm {
            prefix: "HHBU".into(),
            name: "Peter".into(),
            number: "1".into(),
            prefix_locked: false,
            editing: None,
        };
        form.submit(&mut collector).unwrap();
        assert!(form.prefix.is_empty() && form.name.is_empty() && form.number.is_empty());

        form.toggle_prefix_lock();
        assert_eq!(form.lock_label(), "已鎖定");
        form.prefix = "HHBU".into();
        form.name = "Mary".into();
        form.submit(&mut collector).unwrap();
        assert_eq!(form.prefix, "HHBU");
        assert!(form.name.is_empty());

        form.number = "bad".into();
        form.name = "Kit".into();
        assert!(form.number_is_invalid());
        assert!(form.submit(&mut collector).is_err());
        assert_eq!(form.name, "Kit");
        assert_eq!(collector.len(), 2);
    }

    #[test]
    fn test_form_edits_selected_entry() {
        let mut collector = ContactCollector::new();
        collector.add_contact("A", "One", "1").unwrap();
        collector.add_contact("B", "Two", "2").unwrap();

        let mut form = ContactForm::default();
        let second = collector.contacts()[1].clone();
        form.begin_edit(1, &second);
        assert_eq!(form.name, "Two");

        form.number = "2x".into();
        assert_eq!(form.submit(&mut collector), Err(ContactError::InvalidNumberFormat));
        assert_eq!(form.editing, Some(1));

        form.number = "22".into();
        assert_eq!(form.submit(&mut collector), Ok(AddOutcome::Updated));
        assert_eq!(collector.len(), 2);
        assert_eq!(collector.contacts()[1], Contact::new("B", "Two", "22"));
        assert_eq!(form.editing, None);
        assert!(form.name.is_empty());

        form.begin_edit(0, &collector.contacts()[0].clone());
        form.cancel_edit();
        assert_eq!(form.editing, None);
        assert!(form.prefix.is_empty());
    }

    #[test]
    fn test_vcf_written_to_disk_clears_list() {
        let dir = tempfile::tempdir().unwrap();
        let mut collector = ContactCollector::new();
        collector.add_contact("HHBU", "Peter", "+85212345678").unwrap();
        let export = collector.export_to(dir.path(), day()).unwrap().unwrap();
        let text = std::fs::read_to_string(dir.path().join(&export.file_name)).unwrap();
        assert!(text.starts_with("BEGIN:VCARD\r\n"));
        assert!(collector.is_empty());
    }

    #[test]
    fn test_failed_write_keeps_contacts() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such-dir");
        let mut collector = ContactCollector::new();
        collector.add_contact("HHBU", "Peter", "+85212345678").unwrap();

        assert!(collector.export_to(&missing, day()).is_err());
        assert_eq!(collector.len(), 1);
    }
}
