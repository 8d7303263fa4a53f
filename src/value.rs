//! Best-effort numeric parsing for monetary cells.
//!
//! The sheets this feeds from mix pt-BR formatting ("3.916,29"), plain
//! decimals, parenthesized negatives, and placeholder text in the same
//! column. Callers depend on the zero fallback, so [`parse_amount`] is a
//! total function: it never fails, it answers 0.0 for anything it cannot
//! read.

/// Tokens that mean "no amount" in the source sheets.
const PLACEHOLDER_TOKENS: &[&str] = &["-", "N/A", "n/a", "Por Consumo"];

/// Converts a raw cell into a signed decimal amount.
///
/// Policy, in order:
/// 1. negative when the text carries enclosing parentheses or a leading or
///    trailing minus;
/// 2. everything but digits, comma, and dot is stripped;
/// 3. comma and dot together: dots are thousands separators, comma is the
///    decimal separator;
/// 4. comma only: decimal separator when it leaves at most two trailing
///    digits, otherwise a separator artifact and all commas are dropped;
/// 5. dot only: left untouched. "1.234" parses as 1.234 and "1.234.567"
///    fails cleanup and answers 0.0; this tie-break is load-bearing for
///    existing sheets and must not change.
pub fn parse_amount(raw: &str) -> f64 {
    let text = raw.trim();
    if text.is_empty() || PLACEHOLDER_TOKENS.contains(&text) {
        return 0.0;
    }

    let negative =
        (text.contains('(') && text.contains(')')) || text.starts_with('-') || text.ends_with('-');

    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if cleaned.is_empty() || cleaned == "." || cleaned == "," {
        return 0.0;
    }

    let normalized = if cleaned.contains(',') && cleaned.contains('.') {
        cleaned.replace('.', "").replace(',', ".")
    } else if cleaned.contains(',') {
        let parts: Vec<&str> = cleaned.split(',').collect();
        if parts.len() == 2 && parts[1].len() <= 2 {
            cleaned.replace(',', ".")
        } else {
            cleaned.replace(',', "")
        }
    } else {
        cleaned
    };

    match normalized.parse::<f64>() {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brazilian_thousands_and_decimal() {
        assert_eq!(parse_amount("3.916,29"), 3916.29);
        assert_eq!(parse_amount("R$ 1.500,50"), 1500.50);
        assert_eq!(parse_amount("123,45"), 123.45);
    }

    #[test]
    fn test_negatives() {
        assert_eq!(parse_amount("(500,00)"), -500.0);
        assert_eq!(parse_amount("-250,00"), -250.0);
        assert_eq!(parse_amount("250,00-"), -250.0);
    }

    #[test]
    fn test_placeholders_and_garbage_are_zero() {
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("-"), 0.0);
        assert_eq!(parse_amount("N/A"), 0.0);
        assert_eq!(parse_amount("n/a"), 0.0);
        assert_eq!(parse_amount("Por Consumo"), 0.0);
        assert_eq!(parse_amount("sem valor"), 0.0);
    }

    #[test]
    fn test_comma_artifacts() {
        // More than two digits after a single comma is grouping noise.
        assert_eq!(parse_amount("1,234567"), 1234567.0);
        assert_eq!(parse_amount("1,234,567"), 1234567.0);
    }

    #[test]
    fn test_dot_only_tiebreak() {
        assert_eq!(parse_amount("1.234"), 1.234);
        assert_eq!(parse_amount("99.9"), 99.9);
        // Multiple dots cannot parse and fall back to zero.
        assert_eq!(parse_amount("1.234.567"), 0.0);
    }
}
