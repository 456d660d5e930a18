// 📤 Export Formatter - records → WhatsApp message text
// Plain text for copy/download; escaped markup for the preview panel.

use crate::filter::{self, FilterState};
use crate::record::{Record, RecordId, StatusFlag};
use crate::template::{Fields, Template};
use std::path::{Path, PathBuf};

/// Download file name; no timestamp so re-exports overwrite
pub const EXPORT_FILE_NAME: &str = "院友零用金_匯出.txt";

/// Separator between message blocks
const BLOCK_SEPARATOR: &str = "\n\n";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("請至少填寫一列院友名字與截至日期。")]
    NothingToExport,
    #[error("failed to write export file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ============================================================================
// SINGLE RECORD
// ============================================================================

/// `--$<amount>` for a deficit, `$<amount>` for a balance; empty amount is 0
pub fn dollar_part(status: StatusFlag, amount: &str) -> String {
    let amount = if amount.is_empty() { "0" } else { amount };
    match status {
        StatusFlag::Deficit => format!("--${}", amount),
        StatusFlag::Balance => format!("${}", amount),
    }
}

/// Render one record through a parsed template
pub fn format_with(record: &Record, template: &Template<'_>) -> String {
    let dollar = dollar_part(record.status, &record.amount);
    template.render(&Fields {
        name: &record.name,
        date: &record.date,
        type_label: record.status.label(),
        dollar_part: &dollar,
    })
}

/// Render one record through template text. No escaping on this path.
pub fn format_record(record: &Record, template: &str) -> String {
    format_with(record, &Template::parse(template))
}

// ============================================================================
// PREVIEW
// ============================================================================

/// One rendered message as shown in the preview panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewBlock {
    pub record_id: RecordId,
    /// First line of the message (usually the resident's name)
    pub heading: String,
    /// Everything after the first line
    pub body: String,
    /// What the per-block copy action puts on the clipboard
    pub copy_text: String,
    pub dollar_part: String,
    pub flagged: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub plain_text: String,
    pub markup: String,
    pub blocks: Vec<PreviewBlock>,
}

impl Preview {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

fn split_first_line(full: &str) -> (&str, &str) {
    match full.find('\n') {
        Some(end) => (&full[..end], &full[end + 1..]),
        None => (full, ""),
    }
}

fn preview_block(record: &Record, template: &Template<'_>) -> (String, PreviewBlock) {
    let full = format_with(record, template);
    let (first, rest) = split_first_line(&full);
    let heading = if first.is_empty() { record.name.clone() } else { first.to_string() };
    let copy_text = if full.contains('\n') {
        rest.trim_start().to_string()
    } else {
        full.clone()
    };
    let block = PreviewBlock {
        record_id: record.id,
        heading,
        body: rest.to_string(),
        copy_text,
        dollar_part: dollar_part(record.status, &record.amount),
        flagged: record.status.is_deficit(),
    };
    (full, block)
}

fn block_markup(block: &PreviewBlock) -> String {
    let escaped_dollar = escape_html(&block.dollar_part);
    let amount_class = if block.flagged { "preview-amount deficit" } else { "preview-amount" };
    let amount_span = format!("<span class=\"{}\">{}</span>", amount_class, escaped_dollar);
    let body = escape_html(&block.body).replace(&escaped_dollar, &amount_span);
    let block_class = if block.flagged { "preview-block deficit" } else { "preview-block" };

    format!(
        concat!(
            "<div class=\"{}\">",
            "<div class=\"preview-block-head\">",
            "<span class=\"preview-name\">{}</span>",
            "<button type=\"button\" class=\"btn-copy-preview\" title=\"複製此段內容\">複製</button>",
            "</div>",
            "<pre class=\"preview-body\">{}</pre>",
            "</div>"
        ),
        block_class,
        escape_html(&block.heading),
        body
    )
}

/// Render the committed records visible under `filter`.
///
/// Plain text joins blocks with a blank line. Markup escapes user content,
/// splits off the first line as a heading and wraps every occurrence of the
/// dollar amount in a highlight span; deficit blocks get an extra class.
pub fn format_preview(records: &[Record], filter: FilterState, template: &str) -> Preview {
    let template = Template::parse(template);
    let mut texts = Vec::new();
    let mut blocks = Vec::new();

    for record in filter::visible(records, filter) {
        if record.is_input() {
            continue;
        }
        let (full, block) = preview_block(record, &template);
        texts.push(full);
        blocks.push(block);
    }

    let markup = blocks.iter().map(block_markup).collect::<String>();

    Preview {
        plain_text: texts.join(BLOCK_SEPARATOR),
        markup,
        blocks,
    }
}

// ============================================================================
// DOWNLOAD BUNDLE
// ============================================================================

/// Every committed record with a name and a date, filter ignored
pub fn format_export_bundle(records: &[Record], template: &str) -> String {
    let template = Template::parse(template);
    records
        .iter()
        .filter(|r| !r.is_input() && r.is_complete())
        .map(|r| format_with(r, &template))
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Write the bundle to `<dir>/院友零用金_匯出.txt`
pub fn write_export(dir: &Path, text: &str) -> Result<PathBuf, ExportError> {
    if text.trim().is_empty() {
        return Err(ExportError::NothingToExport);
    }
    let path = dir.join(EXPORT_FILE_NAME);
    std::fs::write(&path, text).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = text.len(), "petty cash export written");
    Ok(path)
}

// ============================================================================
// HTML ESCAPING
// ============================================================================

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordStore;
    use crate::template::DEFAULT_TEMPLATE;

    fn commit(store: &mut RecordStore, name: &str, date: &str, status: StatusFlag, amount: &str) {
        store.set_input_name(name);
        store.set_input_date(date);
        store.set_input_status(status);
        store.set_input_amount(amount);
        store.commit_input().unwrap();
    }

    #[test]
    fn test_dollar_part_sign_and_default() {
        assert_eq!(dollar_part(StatusFlag::Deficit, "50"), "--$50");
        assert_eq!(dollar_part(StatusFlag::Balance, "12.5"), "$12.5");
        assert_eq!(dollar_part(StatusFlag::Balance, ""), "$0");
        assert_eq!(dollar_part(StatusFlag::Deficit, ""), "--$0");
    }

    #[test]
    fn test_default_template_scenario() {
        let mut store = RecordStore::new();
        commit(&mut store, "陳大文", "2024-01-01", StatusFlag::Deficit, "50");

        let text = format_record(&store.committed()[0], DEFAULT_TEMPLATE);
        assert!(text.starts_with("陳大文\n"));
        assert!(text.contains("院友零用金結欠，截至2024-01-01為--$50。"));
        assert!(!text.contains('{'));
    }

    #[test]
    fn test_plain_text_is_not_escaped() {
        let mut store = RecordStore::new();
        commit(&mut store, "A&B <C>", "2024-01-01", StatusFlag::Balance, "1");
        let text = format_record(&store.committed()[0], "{name}");
        assert_eq!(text, "A&B <C>");
    }

    #[test]
    fn test_preview_respects_filter_and_separator() {
        let mut store = RecordStore::new();
        commit(&mut store, "A", "2024-01-01", StatusFlag::Deficit, "1");
        commit(&mut store, "B", "2024-01-01", StatusFlag::Balance, "2");
        commit(&mut store, "C", "2024-01-01", StatusFlag::Deficit, "3");

        let all = format_preview(store.committed(), FilterState::All, "{name}:{dollarPart}");
        assert_eq!(all.plain_text, "A:--$1\n\nB:$2\n\nC:--$3");

        let flagged = format_preview(store.committed(), FilterState::Flagged, "{name}:{dollarPart}");
        assert_eq!(flagged.plain_text, "A:--$1\n\nC:--$3");
        assert!(flagged.blocks.iter().all(|b| b.flagged));

        let none = format_preview(&[], FilterState::All, DEFAULT_TEMPLATE);
        assert!(none.is_empty());
        assert_eq!(none.plain_text, "");
        assert_eq!(none.markup, "");
    }

    #[test]
    fn test_preview_markup_escapes_and_highlights() {
        let mut store = RecordStore::new();
        commit(&mut store, "<b>陳</b>", "2024-01-01", StatusFlag::Deficit, "50");

        let preview = format_preview(
            store.committed(),
            FilterState::All,
            "{name}\n欠{dollarPart} & 再次 {dollarPart}",
        );
        let markup = &preview.markup;

        assert!(markup.starts_with("<div class=\"preview-block deficit\">"));
        assert!(markup.contains("<span class=\"preview-name\">&lt;b&gt;陳&lt;/b&gt;</span>"));
        assert!(!markup.contains("<b>"));
        assert_eq!(
            markup.matches("<span class=\"preview-amount deficit\">--$50</span>").count(),
            2
        );
        assert!(markup.contains(" &amp; 再次 "));

        // Plain path keeps raw characters
        assert!(preview.plain_text.starts_with("<b>陳</b>\n"));
    }

    #[test]
    fn test_copy_text_drops_heading() {
        let mut store = RecordStore::new();
        commit(&mut store, "A", "2024-01-01", StatusFlag::Balance, "5");

        let preview = format_preview(store.committed(), FilterState::All, "{name}\n\n  您好 {dollarPart}");
        let block = &preview.blocks[0];
        assert_eq!(block.heading, "A");
        assert_eq!(block.body, "\n  您好 $5");
        assert_eq!(block.copy_text, "您好 $5");

        let single = format_preview(store.committed(), FilterState::All, "{name} {dollarPart}");
        assert_eq!(single.blocks[0].copy_text, "A $5");
        assert_eq!(single.blocks[0].body, "");
    }

    #[test]
    fn test_bundle_ignores_filter_and_is_idempotent() {
        let mut store = RecordStore::new();
        commit(&mut store, "A", "2024-01-01", StatusFlag::Deficit, "1");
        commit(&mut store, "B", "2024-01-02", StatusFlag::Balance, "");

        let first = format_export_bundle(store.committed(), DEFAULT_TEMPLATE);
        let second = format_export_bundle(store.committed(), DEFAULT_TEMPLATE);
        assert_eq!(first, second);
        assert_eq!(first.matches("Helping Hand").count(), 2);
        assert!(first.contains("為$0。"));
        assert!(first.contains("Helping Hand\n\nB\n"));
    }

    #[test]
    fn test_write_export_refuses_empty() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_export(dir.path(), "  \n").unwrap_err();
        assert!(matches!(err, ExportError::NothingToExport));
        assert!(!dir.path().join(EXPORT_FILE_NAME).exists());
    }

    #[test]
    fn test_write_export_writes_utf8_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_export(dir.path(), "陳大文\n--$50").unwrap();
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), EXPORT_FILE_NAME);
        assert_eq!(std::fs::read_to_string(path).unwrap(), "陳大文\n--$50");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&</a>"#), "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;");
        assert_eq!(escape_html("陳大文"), "陳大文");
    }
}
