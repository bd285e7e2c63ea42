use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Size estimates for table boxes.
///
/// Tables get a fixed width; height grows with the column count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    pub table_width: f64,
    pub header_height: f64,
    pub row_height: f64,
    pub padding_y: f64,
    pub min_table_height: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            table_width: 220.0,
            header_height: 36.0,
            row_height: 24.0,
            padding_y: 8.0,
            min_table_height: 60.0,
        }
    }
}

impl TextMetrics {
    /// Bounding box estimate for a table with `column_count` columns.
    pub fn table_size(&self, column_count: usize) -> (f64, f64) {
        let body_height = if column_count == 0 {
            0.0
        } else {
            column_count as f64 * self.row_height + self.padding_y * 2.0
        };
        let height = (self.header_height + body_height).max(self.min_table_height);
        (self.table_width, height)
    }
}

/// Truncate `text` to at most `max_cells` terminal cells, marking the cut with `…`.
pub fn fit_label(text: &str, max_cells: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_cells {
        return text.to_string();
    }
    if max_cells == 0 {
        return String::new();
    }

    let budget = max_cells - 1;
    let mut used = 0;
    let mut out = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_size_no_columns() {
        let m = TextMetrics::default();
        assert_eq!(m.table_size(0), (220.0, 60.0));
    }

    #[test]
    fn test_table_size_grows_with_columns() {
        let m = TextMetrics::default();
        let (w3, h3) = m.table_size(3);
        let (w4, h4) = m.table_size(4);
        assert_eq!(w3, w4);
        assert_eq!(h4 - h3, m.row_height);
    }

    #[test]
    fn test_fit_label() {
        assert_eq!(fit_label("orders.id", 20), "orders.id");
        assert_eq!(fit_label("transactions.order_id", 8), "transac…");
        assert_eq!(fit_label("患者記録", 5), "患者…");
        assert_eq!(fit_label("abc", 0), "");
    }
}
