//! Tabular chart data parsed from CSV uploads.

use crate::error::{Error, Result};

/// A parsed CSV table: a header row followed by equally long data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// One plottable column; `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl Series {
    /// Smallest and largest present value.
    pub fn range(&self) -> Option<(f64, f64)> {
        self.values.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

impl ChartTable {
    /// Parse CSV bytes for the slide titled `slide`.
    ///
    /// Fails when the CSV is syntactically broken, rows have differing
    /// lengths, there are no data rows, or no column is numeric.
    pub fn parse_csv(slide: &str, data: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(data);

        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| Error::chart_data(slide, format!("unreadable header: {}", e)))?
            .iter()
            .map(str::to_string)
            .collect();

        if columns.iter().all(|c| c.is_empty()) {
            return Err(Error::chart_data(slide, "no columns"));
        }

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record
                .map_err(|e| Error::chart_data(slide, format!("row {}: {}", line + 1, e)))?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        if rows.is_empty() {
            return Err(Error::chart_data(slide, "no data rows"));
        }

        let table = Self { columns, rows };
        if table.numeric_series().is_empty() {
            return Err(Error::chart_data(slide, "no numeric columns to plot"));
        }

        log::debug!(
            "Parsed chart data for '{}': {} columns, {} rows",
            slide,
            table.columns.len(),
            table.rows.len()
        );

        Ok(table)
    }

    /// Column headers.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Columns whose every non-empty cell is a finite number, in column order.
    ///
    /// Columns with text cells, or with no values at all, are skipped.
    pub fn numeric_series(&self) -> Vec<Series> {
        let mut series = Vec::new();

        for (col, name) in self.columns.iter().enumerate() {
            let mut values = Vec::with_capacity(self.rows.len());
            let mut numeric = true;

            for row in &self.rows {
                let cell = row.get(col).map(|s| s.trim()).unwrap_or("");
                if cell.is_empty() {
                    values.push(None);
                    continue;
                }
                match cell.parse::<f64>() {
                    Ok(v) if v.is_finite() => values.push(Some(v)),
                    _ => {
                        numeric = false;
                        break;
                    }
                }
            }

            if numeric && values.iter().any(Option::is_some) {
                series.push(Series {
                    name: name.clone(),
                    values,
                });
            }
        }

        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_table() {
        let table = ChartTable::parse_csv("Sales", b"q1,q2\n1,2\n3,4\n").unwrap();
        assert_eq!(table.columns(), &["q1".to_string(), "q2".to_string()]);
        assert_eq!(table.rows().len(), 2);

        let series = table.numeric_series();
        assert_eq!(series.len(), 2);
        assert_eq!(series[1].values, vec![Some(2.0), Some(4.0)]);
        assert_eq!(series[0].range(), Some((1.0, 3.0)));
    }

    #[test]
    fn test_text_columns_are_skipped() {
        let table = ChartTable::parse_csv("Sales", b"month,revenue\nJan,10\nFeb,12.5\n").unwrap();
        let series = table.numeric_series();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].name, "revenue");
    }

    #[test]
    fn test_missing_cells_become_gaps() {
        let table = ChartTable::parse_csv("Gaps", b"a\n1\n\"\"\n3\n").unwrap();
        assert_eq!(table.numeric_series()[0].values, vec![Some(1.0), None, Some(3.0)]);
    }

    #[test]
    fn test_ragged_rows_are_malformed() {
        let result = ChartTable::parse_csv("Broken", b"a,b\n1,2\n3\n");
        match result {
            Err(Error::ChartData { slide, .. }) => assert_eq!(slide, "Broken"),
            other => panic!("expected chart data error, got {:?}", other),
        }
    }

    #[test]
    fn test_no_rows_is_malformed() {
        assert!(matches!(
            ChartTable::parse_csv("Empty", b"a,b\n"),
            Err(Error::ChartData { .. })
        ));
        assert!(matches!(
            ChartTable::parse_csv("Empty", b""),
            Err(Error::ChartData { .. })
        ));
    }

    #[test]
    fn test_no_numeric_columns_is_malformed() {
        let result = ChartTable::parse_csv("Words", b"name,city\nAda,London\n");
        assert!(matches!(result, Err(Error::ChartData { .. })));
    }
}
