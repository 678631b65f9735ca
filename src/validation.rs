use crate::types::constants::BINARY_PERCENT;
use std::collections::HashSet;

/// Check if sample data appears to be binary
pub fn is_binary_data(data: &[u8]) -> bool {
    if data.is_empty() {
        return false;
    }

    // Check first line only
    let first_line_end = memchr::memchr(b'\n', data)
        .unwrap_or(data.len())
        .min(1024);

    let sample = &data[..first_line_end];

    // UTF-16 text is full of NUL bytes, leave it to the charset decoder
    if sample.starts_with(&[0xFF, 0xFE]) || sample.starts_with(&[0xFE, 0xFF]) {
        return false;
    }
    let sample = sample.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(sample);

    if sample.is_empty() {
        return false;
    }

    // Count unprintable characters, tabs and carriage returns are fine
    let unprintable_count = sample
        .iter()
        .filter(|&&b| (b < 0x20 && b != b'\t' && b != b'\r') || b == 0x7F)
        .count();

    let percentage = (unprintable_count * 100) / sample.len();
    percentage >= BINARY_PERCENT
}

/// Check whether a quoted field is still open at the end of the text.
/// Quotes only open a field at its start; a doubled quote inside is an escape.
pub fn has_unterminated_quote(text: &str, delimiter: char, quote: char) -> bool {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        FieldStart,
        Unquoted,
        Quoted,
        QuoteInQuoted,
    }

    let mut state = State::FieldStart;
    for c in text.chars() {
        let ends_field = c == delimiter || c == '\n' || c == '\r';
        state = match state {
            State::FieldStart if c == quote => State::Quoted,
            State::FieldStart | State::Unquoted | State::QuoteInQuoted if ends_field => {
                State::FieldStart
            }
            State::FieldStart | State::Unquoted => State::Unquoted,
            State::Quoted if c == quote => State::QuoteInQuoted,
            State::Quoted => State::Quoted,
            State::QuoteInQuoted if c == quote => State::Quoted,
            State::QuoteInQuoted => State::Unquoted,
        };
    }

    state == State::Quoted
}

/// Make header names unique and non-empty.
/// Blank names become `Unnamed: <index>`, repeats get a `.1`, `.2` ... suffix.
pub fn normalize_header_names(headers: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(headers.len());

    for (idx, header) in headers.iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", idx)
        } else {
            header.clone()
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }

        if name != *header {
            log::debug!("renamed column {} from {:?} to {:?}", idx, header, name);
        }
        seen.insert(name.clone());
        names.push(name);
    }

    names
}
