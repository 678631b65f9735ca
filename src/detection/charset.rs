use crate::error::{Result, TableError};
use crate::types::constants::CSVA_GUESS_SIZE;
use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

/// Allow guessing UTF-8 encoding
const ALLOW_UTF8: bool = true;

/// Detect the character encoding of the given data.
pub fn detect_charset(data: &[u8]) -> &'static Encoding {
    // Check for BOM markers first
    if let Some((encoding, _)) = Encoding::for_bom(data) {
        return encoding;
    }

    // For small files, use quick encoding guess
    if data.len() <= CSVA_GUESS_SIZE {
        return guess_encoding_quick(data);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(data, true);
    detector.guess(None, ALLOW_UTF8)
}

/// Quick encoding detection for small samples
fn guess_encoding_quick(data: &[u8]) -> &'static Encoding {
    match std::str::from_utf8(data) {
        Ok(_) => UTF_8,
        Err(_) => {
            let mut detector = EncodingDetector::new();
            detector.feed(data, true);
            detector.guess(None, ALLOW_UTF8)
        }
    }
}

/// Decode data to UTF-8 with the detected charset, stripping any BOM.
/// Bytes that are not valid in the detected charset are a parse error.
pub fn decode_to_utf8(data: &[u8]) -> Result<String> {
    let encoding = detect_charset(data);
    log::debug!("detected charset {}", encoding.name());

    let (decoded, had_errors) = encoding.decode_with_bom_removal(data);
    if had_errors {
        return Err(TableError::Parse(format!(
            "input is not valid {} text",
            encoding.name()
        )));
    }
    Ok(decoded.into_owned())
}
