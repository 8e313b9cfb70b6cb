//! Table exports: matrices, delimited text, Markdown and console tables.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement};

use chartable_model::{CellValue, DelimitedOptions, Result};

use crate::delimited::write_delimited;
use crate::table::Table;

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn escape_markdown(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

impl Table {
    /// Header row of slugs followed by one row of materialized cells per row.
    pub fn to_matrix(&self) -> Vec<Vec<CellValue>> {
        let slugs = self.column_slugs();
        let mut matrix = Vec::with_capacity(self.num_rows() + 1);
        matrix.push(slugs.iter().map(|&slug| CellValue::from(slug)).collect());
        for row in self.rows() {
            matrix.push(
                slugs
                    .iter()
                    .map(|&slug| row.get(slug).cloned().unwrap_or(CellValue::Null))
                    .collect(),
            );
        }
        matrix
    }

    /// Delimited text of the materialized cells. Sentinels render per `options`.
    pub fn to_delimited(&self, options: &DelimitedOptions) -> Result<String> {
        let header: Vec<String> = self
            .defs()
            .iter()
            .map(|def| {
                if options.use_display_names {
                    def.display_name().to_string()
                } else {
                    def.slug.clone()
                }
            })
            .collect();
        let columns: Vec<&[CellValue]> = self
            .column_slugs()
            .into_iter()
            .map(|slug| self.get_values_for(slug).unwrap_or_default())
            .collect();
        let records = (0..self.num_rows()).map(|row| {
            columns
                .iter()
                .filter_map(|column| column.get(row))
                .collect::<Vec<_>>()
        });
        write_delimited(&header, records, options)
    }

    pub fn to_csv(&self) -> Result<String> {
        self.to_delimited(&DelimitedOptions::csv())
    }

    pub fn to_tsv(&self) -> Result<String> {
        self.to_delimited(&DelimitedOptions::tsv())
    }

    /// GitHub-flavoured Markdown table of formatted values.
    pub fn to_markdown(&self) -> String {
        let slugs = self.column_slugs();
        let mut lines = Vec::with_capacity(self.num_rows() + 2);
        lines.push(format!(
            "| {} |",
            slugs.iter().map(|slug| escape_markdown(slug)).collect::<Vec<_>>().join(" | ")
        ));
        lines.push(format!("|{}|", vec![" --- "; slugs.len()].join("|")));
        for row in 0..self.num_rows() {
            let cells: Vec<String> = slugs
                .iter()
                .map(|slug| {
                    self.get_column(slug)
                        .and_then(|column| column.values().get(row).map(|cell| column.format_value(cell)))
                        .map(|text| escape_markdown(&text))
                        .unwrap_or_default()
                })
                .collect();
            lines.push(format!("| {} |", cells.join(" | ")));
        }
        lines.join("\n")
    }

    /// Box-drawn table of formatted values for terminals. Numeric columns are
    /// right-aligned; sentinels show their names.
    pub fn to_console_table(&self) -> String {
        let mut console = comfy_table::Table::new();
        console
            .load_preset(UTF8_FULL_CONDENSED)
            .apply_modifier(UTF8_ROUND_CORNERS)
            .set_content_arrangement(ContentArrangement::Dynamic);
        let slugs = self.column_slugs();
        console.set_header(slugs.iter().map(|slug| header_cell(slug)).collect::<Vec<_>>());
        for row in 0..self.num_rows() {
            let cells: Vec<Cell> = slugs
                .iter()
                .filter_map(|slug| self.get_column(slug))
                .map(|column| match column.values().get(row) {
                    Some(CellValue::Error(error)) => {
                        Cell::new(error.error_string()).fg(Color::DarkGrey)
                    }
                    Some(cell) => Cell::new(column.format_value(cell)),
                    None => Cell::new(""),
                })
                .collect();
            console.add_row(cells);
        }
        for (index, slug) in slugs.iter().enumerate() {
            let numeric = self
                .get_column(slug)
                .is_some_and(|column| column.behavior().is_numeric);
            if let Some(column) = console.column_mut(index)
                && numeric
            {
                column.set_cell_alignment(CellAlignment::Right);
            }
        }
        console.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chartable_model::{ColumnDef, ColumnKind, ErrorRendering};

    use crate::table::Table;

    fn table() -> Table {
        Table::from_delimited_with_options(
            "country,gdp\nFrance,1200.5\nSpain,oops",
            vec![
                ColumnDef::new("gdp")
                    .with_kind(ColumnKind::Numeric)
                    .with_name("GDP")
                    .with_num_decimal_places(1),
            ],
            &Default::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_to_csv_blanks_sentinels() {
        assert_eq!(table().to_csv().unwrap(), "country,gdp\nFrance,1200.5\nSpain,\n");
    }

    #[test]
    fn test_to_delimited_with_names() {
        let options = chartable_model::DelimitedOptions::tsv()
            .with_errors(ErrorRendering::Name)
            .with_display_names(true);
        assert_eq!(
            table().to_delimited(&options).unwrap(),
            "country\tGDP\nFrance\t1200.5\nSpain\tNotParseableAsNumber\n"
        );
    }

    #[test]
    fn test_to_matrix() {
        let matrix = table().to_matrix();
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix[0][1], chartable_model::CellValue::from("gdp"));
    }

    #[test]
    fn test_to_markdown() {
        insta::assert_snapshot!(table().to_markdown(), @r"
        | country | gdp |
        | --- | --- |
        | France | 1,200.5 |
        | Spain |  |
        ");
    }

    #[test]
    fn test_console_table_lists_every_cell() {
        let rendered = table().to_console_table();
        assert!(rendered.contains("1,200.5"));
        assert!(rendered.contains("NotParseableAsNumber"));
        assert!(rendered.contains("country"));
    }
}
