//! Table cell extraction from the source text.
//!
//! The `gherkin` AST exposes table rows but its cell splitting is not aware
//! of escaped pipes. Rows are therefore re-read from the source slice covered
//! by the table span and split on unescaped `|` characters, with `\|`
//! unescaped in the resulting cells.
//!
//! The grammar also splits on escaped pipes when it checks row widths, so the
//! text handed to it has every `\|` on a table line masked by a placeholder of
//! the same byte length. Spans into the masked text are valid in the source.

use std::borrow::Cow;

use gherkin::Span;

const ESCAPED_PIPE: &str = "\\|";
/// U+0080 encodes to two bytes, as does `\|`.
const PIPE_MASK: &str = "\u{80}";

/// Mask `\|` on lines that start with `|`.
///
/// Sources that already contain the placeholder are returned unchanged.
pub(super) fn mask_escaped_pipes(source: &str) -> Cow<'_, str> {
    if source.contains(PIPE_MASK) || !source.contains(ESCAPED_PIPE) {
        return Cow::Borrowed(source);
    }
    let masked: String = source
        .split_inclusive('\n')
        .map(|line| {
            if line.trim_start().starts_with('|') {
                Cow::Owned(line.replace(ESCAPED_PIPE, PIPE_MASK))
            } else {
                Cow::Borrowed(line)
            }
        })
        .collect();
    Cow::Owned(masked)
}

/// Undo [`mask_escaped_pipes`] in text the grammar copied out verbatim.
pub(super) fn restore_escaped_pipes(text: &str) -> String {
    text.replace(PIPE_MASK, ESCAPED_PIPE)
}

/// Re-split every row of the table covered by `span`.
///
/// Returns `None` when the span does not address a valid slice of `source`
/// or contains no pipe-delimited rows.
pub(super) fn rows_from_source(source: &str, span: Span) -> Option<Vec<Vec<String>>> {
    let text = source.get(span.start..span.end)?;
    let rows: Vec<Vec<String>> = text
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('|'))
        .map(split_row)
        .collect();
    if rows.is_empty() { None } else { Some(rows) }
}

/// Unescape cells already split by the `gherkin` parser.
pub(super) fn unescape_rows(rows: &[Vec<String>]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| row.iter().map(|cell| unescape_cell(cell)).collect())
        .collect()
}

fn unescape_cell(cell: &str) -> String {
    cell.trim().replace(ESCAPED_PIPE, "|").replace(PIPE_MASK, "|")
}

/// Split one `| a | b |` line into trimmed, unescaped cells.
fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut opened = false;
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '|' => {
                if opened {
                    cells.push(current.trim().to_string());
                }
                current.clear();
                opened = true;
            }
            other => current.push(other),
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("| a | b |", &["a", "b"])]
    #[case("|a|b|", &["a", "b"])]
    #[case("| a \\| b | c |", &["a | b", "c"])]
    #[case("|  |", &[""])]
    #[case("| x | trailing", &["x"])]
    fn splits_on_unescaped_pipes(#[case] line: &str, #[case] expected: &[&str]) {
        assert_eq!(split_row(line), expected);
    }

    #[test]
    fn rows_are_read_from_span() {
        let source = "Given x\n  | h |\n  | v |\nThen y\n";
        let start = source.find('|').unwrap_or_default();
        let end = source.find("Then").unwrap_or_default();
        let rows = rows_from_source(source, Span { start, end });
        assert_eq!(
            rows,
            Some(vec![vec!["h".to_string()], vec!["v".to_string()]])
        );
    }

    #[test]
    fn invalid_span_yields_none() {
        assert_eq!(rows_from_source("| a |", Span { start: 3, end: 99 }), None);
    }

    #[rstest]
    #[case(" a \\| b ")]
    #[case(" a \u{80} b ")]
    fn fallback_unescapes_cells(#[case] cell: &str) {
        let rows = vec![vec![cell.to_string()]];
        assert_eq!(unescape_rows(&rows), vec![vec!["a | b".to_string()]]);
    }

    #[test]
    fn masking_keeps_byte_offsets() {
        let source = "Given x\n  | a \\| b | c |\n  | d | e |\nThen \\| kept\n";
        let masked = mask_escaped_pipes(source);
        assert_eq!(masked.len(), source.len());
        assert_eq!(masked.matches('|').count(), 7);
        assert!(masked.contains("Then \\| kept"));
        assert_eq!(restore_escaped_pipes(&masked), source);
    }

    #[test]
    fn sources_without_escapes_are_borrowed() {
        assert!(matches!(mask_escaped_pipes("| a | b |\n"), Cow::Borrowed(_)));
    }
}
