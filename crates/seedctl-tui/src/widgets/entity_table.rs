//! Table of rendered entity rows with a selection highlight.

use ratatui::layout::Constraint;
use ratatui::widgets::{Cell, Row, Table};

use seedctl_core::Rendered;

use crate::theme;

/// Column constraints from the preferred field widths. The last column
/// takes whatever space remains.
pub fn constraints(rendered: &Rendered) -> Vec<Constraint> {
    let last = rendered.widths.len().saturating_sub(1);
    rendered
        .widths
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            if i == last {
                Constraint::Min(w)
            } else {
                Constraint::Length(w)
            }
        })
        .collect()
}

pub fn table(rendered: &Rendered) -> Table<'_> {
    let header = Row::new(
        rendered
            .headers
            .iter()
            .map(|h| Cell::from(*h).style(theme::table_header())),
    );
    let rows = rendered.rows.iter().map(|row| {
        Row::new(row.iter().map(|cell| Cell::from(cell.as_str()))).style(theme::table_row())
    });
    Table::new(rows, constraints(rendered))
        .header(header)
        .column_spacing(1)
        .row_highlight_style(theme::table_selected())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn last_column_stretches() {
        let rendered = Rendered {
            headers: vec!["ID", "Name"],
            widths: vec![4, 30],
            rows: Vec::new(),
        };
        assert_eq!(
            constraints(&rendered),
            vec![Constraint::Length(4), Constraint::Min(30)]
        );
    }

    #[test]
    fn no_columns_no_constraints() {
        let rendered = Rendered {
            headers: Vec::new(),
            widths: Vec::new(),
            rows: Vec::new(),
        };
        assert!(constraints(&rendered).is_empty());
    }
}
