use crate::types::constants::{FIELD_DELIMS, FIELD_DELIM_PERCENT};

/// Detect the field delimiter by counting frequencies across lines.
/// Returns `None` when no candidate appears in enough lines.
pub fn detect_delimiter(lines: &[&str], text_sep: char) -> Option<char> {
    if lines.is_empty() {
        return None;
    }

    let mut delim_stats: Vec<(char, usize, usize)> = FIELD_DELIMS
        .iter()
        .map(|&d| (d, 0, 0)) // (delimiter, total_count, lines_present)
        .collect();

    for line in lines {
        for stat in delim_stats.iter_mut() {
            let count = count_delimiters(stat.0, line, text_sep);
            stat.1 += count;
            if count > 0 {
                stat.2 += 1;
            }
        }
    }

    // Highest total wins; ties go to the earlier (higher priority) candidate
    let best = delim_stats
        .iter()
        .filter(|stat| stat.1 > 0)
        .fold(None::<&(char, usize, usize)>, |best, stat| match best {
            Some(b) if b.1 >= stat.1 => Some(b),
            _ => Some(stat),
        })?;

    let percentage = (best.2 * 100) / lines.len();
    if percentage >= FIELD_DELIM_PERCENT {
        Some(best.0)
    } else {
        None
    }
}

/// Count occurrences of a delimiter in a line, respecting text separators
pub fn count_delimiters(delimiter: char, line: &str, text_sep: char) -> usize {
    let mut count = 0;
    let mut inside_text = false;

    for c in line.chars() {
        if text_sep != '\0' && c == text_sep {
            inside_text = !inside_text;
        }

        if c == delimiter && !inside_text {
            count += 1;
        }
    }

    count
}
