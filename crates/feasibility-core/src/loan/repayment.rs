use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::table::{DerivedTable, DerivedTableRow, YearSpan};
use crate::types::*;

use super::schedule::{LoanSchedule, LoanYear};

pub const LOAN_TABLE_TITLE: &str = "借款还本付息计划表";

/// Upstream figures the repayment table reads back, one value per operation year.
#[derive(Debug, Clone, Copy)]
pub struct RepaymentSources<'a> {
    pub depreciation_amortization: &'a [Money],
    pub net_profit: &'a [Money],
    pub ebit: &'a [Money],
    pub ebitda: &'a [Money],
    pub income_tax: &'a [Money],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanRepaymentOutput {
    pub table: DerivedTable,
    /// 利息备付率 per year; 0 where nothing is serviced
    pub interest_coverage: Vec<Decimal>,
    /// 偿债备付率 per year; 0 where nothing is serviced
    pub debt_service_coverage: Vec<Decimal>,
}

impl LoanRepaymentOutput {
    pub fn empty() -> Self {
        LoanRepaymentOutput {
            table: DerivedTable::new(LOAN_TABLE_TITLE, YearSpan::Operation),
            interest_coverage: Vec::new(),
            debt_service_coverage: Vec::new(),
        }
    }
}

/// Repayment plan, repayment sources and coverage ratios.
pub fn build_loan_repayment_table(
    schedule: &LoanSchedule,
    sources: &RepaymentSources<'_>,
) -> LoanRepaymentOutput {
    let len = schedule.years.len();
    let pick = |s: &[Money]| -> Vec<Money> {
        (0..len).map(|i| s.get(i).copied().unwrap_or(Decimal::ZERO)).collect()
    };
    let col = |f: fn(&LoanYear) -> Money| -> Vec<Money> {
        schedule.years.iter().map(f).collect()
    };

    let principal = col(|y| y.principal);
    let interest = col(|y| y.interest);
    let interest_and_fees: Vec<Money> = schedule
        .years
        .iter()
        .map(|y| y.interest + y.guarantee_fee)
        .collect();
    let ebit = pick(sources.ebit);
    let ebitda = pick(sources.ebitda);
    let income_tax = pick(sources.income_tax);

    let interest_coverage: Vec<Decimal> = (0..len)
        .map(|i| safe_ratio(ebit[i], interest_and_fees[i]))
        .collect();
    let debt_service_coverage: Vec<Decimal> = (0..len)
        .map(|i| {
            safe_ratio(
                ebitda[i] - income_tax[i],
                interest_and_fees[i] + principal[i],
            )
        })
        .collect();

    let mut table = DerivedTable::new(LOAN_TABLE_TITLE, YearSpan::Operation);
    table.push(DerivedTableRow::header("1", "借款还本付息计划"));
    table.push(DerivedTableRow::balance("1.1", "期初借款余额", col(|y| y.beginning_balance)));
    table.push(DerivedTableRow::subtotal("1.2", "当期还本付息", col(|y| y.debt_service())));
    table.push(DerivedTableRow::item("1.2.1", "其中：还本", principal.clone()));
    table.push(DerivedTableRow::item("1.2.2", "付息", interest));
    table.push(DerivedTableRow::balance("1.3", "期末借款余额", col(|y| y.ending_balance)));

    table.push(DerivedTableRow::header("2", "偿还借款本金的资金来源"));
    table.push(DerivedTableRow::item("2.1", "折旧摊销费", pick(sources.depreciation_amortization)));
    table.push(DerivedTableRow::item("2.2", "利润", pick(sources.net_profit)));
    table.push(DerivedTableRow::item("2.3", "息税前利润", ebit));
    table.push(DerivedTableRow::item("2.4", "其他", vec![Decimal::ZERO; len]));

    table.push(DerivedTableRow::header("3", "计算指标"));
    table.push(DerivedTableRow::item("3.1", "息税折旧摊销前利润", ebitda));
    table.push(DerivedTableRow::item("3.2", "所得税", income_tax));
    table.push(DerivedTableRow::item("3.3", "还利息及担保费", interest_and_fees));
    table.push(DerivedTableRow::item("3.4", "还本金", principal));
    table.push(DerivedTableRow::balance("3.5", "利息备付率", interest_coverage.clone()));
    table.push(DerivedTableRow::balance("3.6", "偿债备付率", debt_service_coverage.clone()));

    LoanRepaymentOutput {
        table,
        interest_coverage,
        debt_service_coverage,
    }
}
