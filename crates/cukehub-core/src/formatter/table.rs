//! Column-aligned rendering of pipe tables.

/// Render `rows` as aligned `| a | b |` lines prefixed by `indent`.
///
/// Cells are escaped before widths are measured, so escaped pipes stay
/// aligned. Short rows are padded with empty cells.
pub(super) fn render_rows(rows: &[&[String]], indent: &str) -> Vec<String> {
    let escaped: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| escape_cell(cell)).collect())
        .collect();
    let columns = escaped.iter().map(Vec::len).max().unwrap_or(0);
    let widths: Vec<usize> = (0..columns)
        .map(|col| {
            escaped
                .iter()
                .filter_map(|row| row.get(col))
                .map(|cell| display_width(cell))
                .max()
                .unwrap_or(0)
        })
        .collect();

    escaped
        .iter()
        .map(|row| {
            let mut line = format!("{indent}|");
            for (col, width) in widths.iter().enumerate() {
                let cell = row.get(col).map_or("", String::as_str);
                let pad = width.saturating_sub(display_width(cell));
                line.push(' ');
                line.push_str(cell);
                line.push_str(&" ".repeat(pad));
                line.push_str(" |");
            }
            line
        })
        .collect()
}

/// Escape pipe characters so a cell cannot split its row.
pub(super) fn escape_cell(cell: &str) -> String {
    cell.replace('|', "\\|")
}

fn display_width(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|c| (*c).to_string()).collect())
            .collect()
    }

    #[test]
    fn columns_are_padded_to_widest_cell() {
        let rows = owned(&[&["code", "total"], &["A", "10"], &["LONGER", "5"]]);
        let refs: Vec<&[String]> = rows.iter().map(Vec::as_slice).collect();
        assert_eq!(
            render_rows(&refs, "  "),
            [
                "  | code   | total |",
                "  | A      | 10    |",
                "  | LONGER | 5     |",
            ]
        );
    }

    #[test]
    fn escaped_pipes_count_towards_width() {
        let rows = owned(&[&["expr"], &["a|b"]]);
        let refs: Vec<&[String]> = rows.iter().map(Vec::as_slice).collect();
        assert_eq!(render_rows(&refs, ""), ["| expr |", "| a\\|b |"]);
    }

    #[test]
    fn short_rows_gain_empty_cells() {
        let rows = owned(&[&["a", "b"], &["c"]]);
        let refs: Vec<&[String]> = rows.iter().map(Vec::as_slice).collect();
        assert_eq!(render_rows(&refs, ""), ["| a | b |", "| c |   |"]);
    }
}
