//! Minimal CSV row encoding for the attendance ledger.
//!
//! Fields are quoted only when they contain a delimiter, a quote or a line
//! break; embedded quotes are doubled.

pub const HEADER: [&str; 3] = ["Name", "Date", "Time"];

pub fn encode_field(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Encode fields as one line, including the trailing `\n`.
pub fn encode_row(fields: &[&str]) -> String {
    let mut line = fields
        .iter()
        .map(|f| encode_field(f))
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

/// Split one line into fields. A trailing `\r` is ignored.
///
/// Quoted fields spanning several lines are not supported; names never
/// contain line breaks in practice.
pub fn parse_row(line: &str) -> Vec<String> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.is_empty() => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain("alice", "alice")]
    #[case::comma("Doe, Jane", "\"Doe, Jane\"")]
    #[case::quote("the \"boss\"", "\"the \"\"boss\"\"\"")]
    #[case::empty("", "")]
    fn test_encode_field(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(encode_field(input), expected);
    }

    #[test]
    fn test_encode_header_row() {
        assert_eq!(encode_row(&HEADER), "Name,Date,Time\n");
    }

    #[test]
    fn test_parse_plain_row() {
        assert_eq!(
            parse_row("alice,2024-03-07,09:05:02"),
            vec!["alice", "2024-03-07", "09:05:02"]
        );
    }

    #[test]
    fn test_parse_strips_carriage_return() {
        assert_eq!(parse_row("bob,2024-01-01,10:00:00\r")[2], "10:00:00");
    }

    #[test]
    fn test_parse_quoted_fields() {
        let encoded = encode_row(&["Doe, \"JJ\" Jane", "2024-03-07", "09:05:02"]);
        let fields = parse_row(encoded.trim_end_matches('\n'));
        assert_eq!(fields[0], "Doe, \"JJ\" Jane");
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn test_parse_empty_line_is_single_empty_field() {
        assert_eq!(parse_row(""), vec![""]);
    }
}
