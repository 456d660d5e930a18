// Resident name list imported from names.txt, used for name suggestions.

use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameBook {
    names: Vec<String>,
}

impl NameBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list with one name per line (CRLF or LF); blanks dropped
    pub fn import(&mut self, text: &str) {
        self.names = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        tracing::debug!(count = self.names.len(), "name list imported");
    }

    pub fn import_file(&mut self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read name list: {:?}", path))?;
        self.import(&text);
        Ok(())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names not already entered on another row, in import order
    pub fn available<'a>(&'a self, used: &HashSet<String>) -> Vec<&'a str> {
        self.names
            .iter()
            .filter(|n| !used.contains(n.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Available names starting with `prefix`, for completion while typing
    pub fn suggest<'a>(&'a self, prefix: &str, used: &HashSet<String>) -> Vec<&'a str> {
        let prefix = prefix.trim();
        self.available(used)
            .into_iter()
            .filter(|n| n.starts_with(prefix))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_handles_crlf_and_blanks() {
        let mut book = NameBook::new();
        book.import("陳大文\r\n\r\n  李小明 \nPeter\n\n");
        assert_eq!(book.names(), &["陳大文", "李小明", "Peter"]);

        book.import("只有一個");
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_available_excludes_used_names() {
        let mut book = NameBook::new();
        book.import("A\nB\nC");
        let used: HashSet<String> = ["B".to_string()].into_iter().collect();
        assert_eq!(book.available(&used), vec!["A", "C"]);
        assert_eq!(book.available(&HashSet::new()), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_suggest_by_prefix() {
        let mut book = NameBook::new();
        book.import("陳大文\n陳小芬\n李小明");
        let used: HashSet<String> = ["陳小芬".to_string()].into_iter().collect();
        assert_eq!(book.suggest("陳", &used), vec!["陳大文"]);
        assert_eq!(book.suggest("", &used), vec!["陳大文", "李小明"]);
    }

    #[test]
    fn test_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.txt");
        std::fs::write(&path, "A\nB\n").unwrap();
        let mut book = NameBook::new();
        book.import_file(&path).unwrap();
        assert_eq!(book.len(), 2);
        assert!(book.import_file(&dir.path().join("missing.txt")).is_err());
    }
}
