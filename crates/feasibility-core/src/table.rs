use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// Presentation role of a table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    /// Section heading; carries no figures
    Header,
    Item,
    Subtotal,
    Total,
}

/// Which columns a table's `per_year` vectors cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearSpan {
    /// Operation years only, index 0 = first operation year
    Operation,
    /// Construction followed by operation years
    Calculation,
}

/// One row of a derived table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedTableRow {
    /// Hierarchical label, e.g. "1.2"
    pub sequence_code: String,
    pub label: String,
    /// The 合计 column. `None` for balances, cumulative series and ratios.
    pub total: Option<Money>,
    pub per_year: Vec<Money>,
    pub row_kind: RowKind,
    /// Set when `total` is fixed by reporting convention rather than summed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub total_by_convention: bool,
}

impl DerivedTableRow {
    fn summed(code: &str, label: &str, per_year: Vec<Money>, row_kind: RowKind) -> Self {
        let total: Money = per_year.iter().copied().sum();
        DerivedTableRow {
            sequence_code: code.to_string(),
            label: label.to_string(),
            total: Some(total),
            per_year,
            row_kind,
            total_by_convention: false,
        }
    }

    pub fn item(code: &str, label: &str, per_year: Vec<Money>) -> Self {
        Self::summed(code, label, per_year, RowKind::Item)
    }

    pub fn subtotal(code: &str, label: &str, per_year: Vec<Money>) -> Self {
        Self::summed(code, label, per_year, RowKind::Subtotal)
    }

    pub fn total(code: &str, label: &str, per_year: Vec<Money>) -> Self {
        Self::summed(code, label, per_year, RowKind::Total)
    }

    pub fn header(code: &str, label: &str) -> Self {
        DerivedTableRow {
            sequence_code: code.to_string(),
            label: label.to_string(),
            total: None,
            per_year: Vec::new(),
            row_kind: RowKind::Header,
            total_by_convention: false,
        }
    }

    /// A row whose per-year values do not add up to anything meaningful.
    pub fn balance(code: &str, label: &str, per_year: Vec<Money>) -> Self {
        DerivedTableRow {
            sequence_code: code.to_string(),
            label: label.to_string(),
            total: None,
            per_year,
            row_kind: RowKind::Item,
            total_by_convention: false,
        }
    }

    /// Override the 合计 column with a conventional value.
    pub fn with_conventional_total(mut self, total: Money) -> Self {
        self.total = Some(total);
        self.total_by_convention = true;
        self
    }

    pub fn value(&self, index: usize) -> Money {
        self.per_year.get(index).copied().unwrap_or(Decimal::ZERO)
    }
}

/// A titled list of rows sharing one column layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedTable {
    pub title: String,
    pub span: YearSpan,
    pub rows: Vec<DerivedTableRow>,
}

impl DerivedTable {
    pub fn new(title: &str, span: YearSpan) -> Self {
        DerivedTable {
            title: title.to_string(),
            span,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: DerivedTableRow) {
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, code: &str) -> Option<&DerivedTableRow> {
        self.rows.iter().find(|r| r.sequence_code == code)
    }

    pub fn row_by_label(&self, label: &str) -> Option<&DerivedTableRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Per-year values of a row, or an empty slice when the row is absent.
    pub fn values(&self, code: &str) -> &[Money] {
        self.row(code).map(|r| r.per_year.as_slice()).unwrap_or(&[])
    }

    /// Single cell, zero when the row or column is absent.
    pub fn value(&self, code: &str, index: usize) -> Money {
        self.row(code).map(|r| r.value(index)).unwrap_or(Decimal::ZERO)
    }

    /// Codes of rows whose 合计 disagrees with the sum of their per-year values.
    pub fn verify_totals(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter(|r| r.row_kind != RowKind::Header && !r.total_by_convention)
            .filter_map(|r| {
                let total = r.total?;
                let sum: Money = r.per_year.iter().copied().sum();
                (total != sum).then(|| r.sequence_code.clone())
            })
            .collect()
    }
}

/// Running sum of a series.
pub fn cumulative(values: &[Money]) -> Vec<Money> {
    values
        .iter()
        .scan(Decimal::ZERO, |acc, v| {
            *acc += *v;
            Some(*acc)
        })
        .collect()
}

/// Element-wise sum of equally long series; shorter inputs are zero-padded.
pub fn sum_series(len: usize, series: &[&[Money]]) -> Vec<Money> {
    (0..len)
        .map(|i| {
            series
                .iter()
                .map(|s| s.get(i).copied().unwrap_or(Decimal::ZERO))
                .sum()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_item_total_is_sum() {
        let row = DerivedTableRow::item("1", "营业收入", vec![dec!(1), dec!(2), dec!(3)]);
        assert_eq!(row.total, Some(dec!(6)));
        assert_eq!(row.row_kind, RowKind::Item);
    }

    #[test]
    fn test_verify_totals_skips_balances_and_conventions() {
        let mut table = DerivedTable::new("t", YearSpan::Operation);
        table.push(DerivedTableRow::header("1", "h"));
        table.push(DerivedTableRow::balance("1.1", "期初借款余额", vec![dec!(5), dec!(4)]));
        table.push(
            DerivedTableRow::item("10", "期初未分配利润", vec![dec!(0), dec!(9)])
                .with_conventional_total(Decimal::ZERO),
        );
        assert!(table.verify_totals().is_empty());

        let mut broken = DerivedTableRow::item("2", "x", vec![dec!(1)]);
        broken.total = Some(dec!(2));
        table.push(broken);
        assert_eq!(table.verify_totals(), vec!["2".to_string()]);
    }

    #[test]
    fn test_missing_row_reads_zero() {
        let table = DerivedTable::new("t", YearSpan::Operation);
        assert!(table.values("9").is_empty());
        assert_eq!(table.value("9", 3), Decimal::ZERO);
    }

    #[test]
    fn test_cumulative_and_sum_series() {
        assert_eq!(
            cumulative(&[dec!(-10), dec!(4), dec!(8)]),
            vec![dec!(-10), dec!(-6), dec!(2)]
        );
        let a = [dec!(1), dec!(2)];
        let b = [dec!(10)];
        assert_eq!(sum_series(2, &[&a, &b]), vec![dec!(11), dec!(2)]);
    }
}
