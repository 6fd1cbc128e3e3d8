//! Minimal CSV handling shared by the exporters and the importer.
//!
//! Fields are separated by commas. A field wrapped in double quotes may
//! contain commas and line breaks, and `""` inside quotes is a literal quote.

/// Quotes `value` and doubles embedded quotes.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

/// Splits one CSV record into trimmed fields.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    fields.push(current);
    fields
        .into_iter()
        .map(|field| field.trim().to_string())
        .collect()
}

/// Non-blank records of `text`.
///
/// Records end at `\n` or `\r\n` outside quotes; a line break inside a
/// quoted field stays part of the field.
pub fn records(text: &str) -> impl Iterator<Item = &str> {
    let mut records = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (index, ch) in text.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\n' if !in_quotes => {
                records.push(&text[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    records.push(&text[start..]);
    records
        .into_iter()
        .map(|record| record.strip_suffix('\r').unwrap_or(record))
        .filter(|record| !record.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{parse_line, quote, records};

    #[test]
    fn parse_line_handles_quotes_and_doubled_quotes() {
        assert_eq!(
            parse_line(r#"2024-01-02,"Pão, leite","12,5",Despesa,"Diz ""oi""""#),
            vec!["2024-01-02", "Pão, leite", "12,5", "Despesa", "Diz \"oi\""]
        );
        assert_eq!(parse_line(" a , b ,"), vec!["a", "b", ""]);
    }

    #[test]
    fn records_keep_quoted_line_breaks() {
        let text = "a,\"Linha\r\nDois\"\r\n\r\nb,\"x \"\"\n\"\"\"\nc,d";
        assert_eq!(
            records(text).collect::<Vec<_>>(),
            vec!["a,\"Linha\r\nDois\"", "b,\"x \"\"\n\"\"\"", "c,d"]
        );
        assert_eq!(parse_line("b,\"x \"\"\n\"\"\""), vec!["b", "x \"\n\""]);
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
