// 📝 Message Templates - closed placeholder engine
// Four placeholders, nothing else. Unknown `{...}` tokens are kept as written.

use std::fmt;

/// Message used whenever a slot is empty or unset
pub const DEFAULT_TEMPLATE: &str = "{name}
您好，有關院友零用金{typeLabel}，截至{date}為{dollarPart}。
請幫忙入數(交現金或WHATSAPP入數紙)，謝謝您。
財務資訊 - 匯豐銀行
零用金戶口：111-135398-006
Helping Hand";

// ============================================================================
// PLACEHOLDERS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Name,
    Date,
    TypeLabel,
    DollarPart,
}

impl Placeholder {
    pub const ALL: [Placeholder; 4] = [
        Placeholder::Name,
        Placeholder::Date,
        Placeholder::TypeLabel,
        Placeholder::DollarPart,
    ];

    /// Token text including braces
    pub fn token(&self) -> &'static str {
        match self {
            Placeholder::Name => "{name}",
            Placeholder::Date => "{date}",
            Placeholder::TypeLabel => "{typeLabel}",
            Placeholder::DollarPart => "{dollarPart}",
        }
    }

    fn from_inner(inner: &str) -> Option<Self> {
        match inner {
            "name" => Some(Placeholder::Name),
            "date" => Some(Placeholder::Date),
            "typeLabel" => Some(Placeholder::TypeLabel),
            "dollarPart" => Some(Placeholder::DollarPart),
            _ => None,
        }
    }
}

// ============================================================================
// PARSED TEMPLATE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'t> {
    Literal(&'t str),
    Slot(Placeholder),
}

/// Values substituted for the four placeholders
#[derive(Debug, Clone, Copy)]
pub struct Fields<'a> {
    pub name: &'a str,
    pub date: &'a str,
    pub type_label: &'a str,
    pub dollar_part: &'a str,
}

impl<'a> Fields<'a> {
    fn value(&self, placeholder: Placeholder) -> &'a str {
        match placeholder {
            Placeholder::Name => self.name,
            Placeholder::Date => self.date,
            Placeholder::TypeLabel => self.type_label,
            Placeholder::DollarPart => self.dollar_part,
        }
    }
}

/// Template text split into literal runs and placeholder slots.
///
/// Tokenizing happens once; substituted values are never re-scanned, so a
/// name containing `{date}` stays literal in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template<'t> {
    segments: Vec<Segment<'t>>,
}

impl<'t> Template<'t> {
    pub fn parse(text: &'t str) -> Self {
        let mut segments = Vec::new();
        let mut literal_start = 0;
        let mut cursor = 0;

        while let Some(open) = text[cursor..].find('{') {
            let open = cursor + open;
            let Some(close) = text[open + 1..].find('}') else {
                break;
            };
            let close = open + 1 + close;

            match Placeholder::from_inner(&text[open + 1..close]) {
                Some(placeholder) => {
                    if literal_start < open {
                        segments.push(Segment::Literal(&text[literal_start..open]));
                    }
                    segments.push(Segment::Slot(placeholder));
                    literal_start = close + 1;
                    cursor = close + 1;
                }
                // Unknown token: keep scanning right after this brace so
                // "{{name}" still finds the inner placeholder.
                None => cursor = open + 1,
            }
        }

        if literal_start < text.len() {
            segments.push(Segment::Literal(&text[literal_start..]));
        }

        Template { segments }
    }

    pub fn segments(&self) -> &[Segment<'t>] {
        &self.segments
    }

    pub fn uses(&self, placeholder: Placeholder) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Slot(p) if *p == placeholder))
    }

    pub fn render(&self, fields: &Fields<'_>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(placeholder) => out.push_str(fields.value(*placeholder)),
            }
        }
        out
    }
}

impl fmt::Display for Template<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Slot(placeholder) => f.write_str(placeholder.token())?,
            }
        }
        Ok(())
    }
}

/// Parse-and-render in one step
pub fn render(text: &str, fields: &Fields<'_>) -> String {
    Template::parse(text).render(fields)
}
