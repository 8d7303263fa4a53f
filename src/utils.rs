/// Lowercases, trims, and folds the diacritics that show up in Portuguese
/// sheet headers and month names, so lookups can compare plain ASCII.
pub fn normalize_text(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'ã' | 'â' => 'a',
            'é' | 'ê' => 'e',
            'í' => 'i',
            'ó' | 'õ' | 'ô' => 'o',
            'ú' => 'u',
            'ç' => 'c',
            'ý' => 'y',
            'ş' => 's',
            'ñ' => 'n',
            _ => c,
        })
        .collect()
}

/// Splits out the maximal runs of ASCII digits in a string, in order.
pub fn digit_runs(s: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let bytes = s.as_bytes();
    let mut start = None;

    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(from) = start.take() {
            runs.push(&s[from..i]);
        }
    }
    if let Some(from) = start {
        runs.push(&s[from..]);
    }

    runs
}

/// Alphabetic runs of the normalized text, used for month-name matching.
pub fn alpha_runs(s: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let bytes = s.as_bytes();
    let mut start = None;

    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_alphabetic() {
            if start.is_none() {
                start = Some(i);
            }
        } else if let Some(from) = start.take() {
            runs.push(&s[from..i]);
        }
    }
    if let Some(from) = start {
        runs.push(&s[from..]);
    }

    runs
}
