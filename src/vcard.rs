// 📇 vCard 3.0 writer - one card per contact, CRLF line endings

use crate::contacts::Contact;

const CRLF: &str = "\r\n";

/// Full name as stored on the phone: prefix glued to name, e.g. `HHBUPeter`
pub fn full_name(contact: &Contact) -> String {
    format!("{}{}", contact.prefix.trim(), contact.name.trim())
}

/// One BEGIN:VCARD … END:VCARD block.
///
/// FN falls back to the number, then to "Unknown"; TEL is always written.
pub fn card(contact: &Contact) -> String {
    let full = full_name(contact);
    let number = contact.number.trim();
    let formatted = if !full.is_empty() {
        full.as_str()
    } else if !number.is_empty() {
        number
    } else {
        "Unknown"
    };
    let structured = if full.is_empty() {
        ";;;".to_string()
    } else {
        format!(";{};;", full)
    };

    let mut out = String::new();
    for line in [
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!("N:{}", structured),
        format!("FN:{}", formatted),
        format!("TEL;TYPE=CELL:{}", number),
        "END:VCARD".to_string(),
    ] {
        out.push_str(&line);
        out.push_str(CRLF);
    }
    out
}

/// Concatenated cards for a whole list
pub fn cards(contacts: &[Contact]) -> String {
    contacts.iter().map(card).collect()
}

/// Value of the first `FIELD:` line in a card (test and display helper)
pub fn field<'a>(card: &'a str, name: &str) -> Option<&'a str> {
    card.split(CRLF).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key == name).then_some(value)
    })
}
