use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::depreciation::{
    amortization_series, depreciation_series, fixed_assets_investment, DepreciationRow,
};
use crate::production_rate::ProductionRateSchedule;
use crate::revenue::items::RevenueItem;
use crate::table::{sum_series, DerivedTable, DerivedTableRow, YearSpan};
use crate::types::*;

use super::categories::*;
use super::config::*;

pub const OPERATING_COST_TITLE: &str = "营业成本估算表";
pub const TOTAL_COST_TITLE: &str = "总成本费用估算表";
pub const RAW_MATERIALS_TITLE: &str = "外购原材料费估算表";
pub const FUEL_POWER_TITLE: &str = "外购燃料和动力费估算表";
pub const WAGES_TITLE: &str = "工资及福利费估算表";

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Everything the cost calculator reads besides the project context.
#[derive(Debug, Clone, Copy)]
pub struct CostInputs<'a> {
    pub config: &'a CostConfig,
    pub revenue_items: &'a [RevenueItem],
    pub rates: &'a ProductionRateSchedule,
    pub depreciation: &'a [DepreciationRow],
    /// Capitalised construction interest, netted out of the repair base
    pub construction_interest: Money,
    /// 利息支出 per operation year, from the loan schedule
    pub interest_expense: &'a [Money],
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostOutput {
    pub operating_cost_table: DerivedTable,
    pub total_cost_table: DerivedTable,
    pub raw_materials_table: DerivedTable,
    pub fuel_power_table: DerivedTable,
    pub wages_table: DerivedTable,
    /// 营业成本: net-of-tax operating cost per year
    pub operating_cost: Vec<Money>,
    /// Deductible input VAT across every category
    pub input_tax: Vec<Money>,
    pub management: Vec<Money>,
    pub interest: Vec<Money>,
    pub depreciation: Vec<Money>,
    pub amortization: Vec<Money>,
    /// 总成本费用
    pub total_cost: Vec<Money>,
}

impl CostOutput {
    pub fn empty() -> Self {
        CostOutput {
            operating_cost_table: DerivedTable::new(OPERATING_COST_TITLE, YearSpan::Operation),
            total_cost_table: DerivedTable::new(TOTAL_COST_TITLE, YearSpan::Operation),
            raw_materials_table: DerivedTable::new(RAW_MATERIALS_TITLE, YearSpan::Operation),
            fuel_power_table: DerivedTable::new(FUEL_POWER_TITLE, YearSpan::Operation),
            wages_table: DerivedTable::new(WAGES_TITLE, YearSpan::Operation),
            operating_cost: Vec::new(),
            input_tax: Vec::new(),
            management: Vec::new(),
            interest: Vec::new(),
            depreciation: Vec::new(),
            amortization: Vec::new(),
            total_cost: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

fn field(splits: &[TaxSplit], pick: fn(&TaxSplit) -> Money) -> Vec<Money> {
    splits.iter().map(pick).collect()
}

/// Itemised purchase table: items, then 进项税额 and the net total.
fn purchase_table(
    title: &str,
    subtotal_label: &str,
    net_label: &str,
    items: &[(String, Vec<TaxSplit>)],
    totals: &[TaxSplit],
) -> DerivedTable {
    let mut table = DerivedTable::new(title, YearSpan::Operation);
    table.push(DerivedTableRow::subtotal("1", subtotal_label, field(totals, |s| s.with_tax)));
    for (idx, (name, splits)) in items.iter().enumerate() {
        table.push(DerivedTableRow::item(
            &format!("1.{}", idx + 1),
            name,
            field(splits, |s| s.with_tax),
        ));
    }
    table.push(DerivedTableRow::subtotal("2", "进项税额", field(totals, |s| s.input_tax)));
    table.push(DerivedTableRow::total("3", net_label, field(totals, |s| s.net_of_tax)));
    table
}

fn column_totals(len: usize, items: &[(String, Vec<TaxSplit>)]) -> Vec<TaxSplit> {
    (0..len)
        .map(|i| items.iter().map(|(_, splits)| splits[i]).sum())
        .collect()
}

/// Revenue links that point at items which no longer exist.
pub fn dangling_revenue_links(config: &CostConfig, revenue_items: &[RevenueItem]) -> Vec<String> {
    config
        .raw_materials
        .items
        .iter()
        .filter_map(|m| match &m.source {
            MaterialSource::PercentageOfRevenue {
                linked_revenue_id: Some(id),
                ..
            } if id != "total" && !revenue_items.iter().any(|r| &r.id == id) => {
                Some(format!(
                    "Raw material '{}' is linked to missing revenue item '{}'; counted as 0",
                    m.name, id
                ))
            }
            _ => None,
        })
        .collect()
}

/// Operating cost, total cost and the itemised detail tables.
pub fn build_costs(
    ctx: &ProjectContext,
    inputs: &CostInputs<'_>,
    warnings: &mut Vec<String>,
) -> CostOutput {
    let years = ctx.operation_years;
    let len = years as usize;
    let config = inputs.config;

    warnings.extend(dangling_revenue_links(config, inputs.revenue_items));
    warnings.extend(salary_overflows(&config.wages, years));

    let drivers = CostDrivers {
        revenue_items: inputs.revenue_items,
        rates: inputs.rates,
        fixed_assets_investment: fixed_assets_investment(
            inputs.depreciation,
            inputs.construction_interest,
        ),
    };

    // Raw materials and fuel/power, item by item
    let materials: Vec<(String, Vec<TaxSplit>)> = config
        .raw_materials
        .items
        .iter()
        .map(|item| {
            let splits = (1..=years)
                .map(|y| {
                    raw_material_year(item, config.raw_materials.apply_production_rate, &drivers, y)
                })
                .collect();
            (item.name.clone(), splits)
        })
        .collect();
    let materials_total = column_totals(len, &materials);

    let fuels: Vec<(String, Vec<TaxSplit>)> = config
        .fuel_power
        .items
        .iter()
        .map(|item| {
            let splits = (1..=years)
                .map(|y| {
                    fuel_power_year(item, config.fuel_power.apply_production_rate, inputs.rates, y)
                })
                .collect();
            (item.name.clone(), splits)
        })
        .collect();
    let fuels_total = column_totals(len, &fuels);

    // Wages
    let positions: Vec<(String, Vec<(Money, Money)>)> = config
        .wages
        .iter()
        .map(|item| (item.name.clone(), (1..=years).map(|y| wage_year(item, y)).collect()))
        .collect();
    let wages_total: Vec<TaxSplit> = (0..len)
        .map(|i| {
            let amount: Money = positions.iter().map(|(_, v)| v[i].0 + v[i].1).sum();
            TaxSplit::untaxed(amount, Decimal::ONE)
        })
        .collect();

    let repair: Vec<TaxSplit> = (1..=years)
        .map(|y| repair_year(&config.repair, &drivers, y))
        .collect();
    let other: Vec<TaxSplit> = (1..=years)
        .map(|y| other_expenses_year(&config.other_expenses, &drivers, y))
        .collect();

    let categories: [(&str, &[TaxSplit]); 5] = [
        ("外购原材料费", materials_total.as_slice()),
        ("外购燃料及动力费", fuels_total.as_slice()),
        ("工资及福利费", wages_total.as_slice()),
        ("修理费", repair.as_slice()),
        ("其他费用", other.as_slice()),
    ];
    let combined: Vec<TaxSplit> = (0..len)
        .map(|i| categories.iter().map(|(_, s)| s[i]).sum())
        .collect();

    // 营业成本估算表
    let mut operating_cost_table = DerivedTable::new(OPERATING_COST_TITLE, YearSpan::Operation);
    operating_cost_table.push(DerivedTableRow::subtotal(
        "1",
        "含税成本",
        field(&combined, |s| s.with_tax),
    ));
    for (idx, (label, splits)) in categories.iter().enumerate() {
        operating_cost_table.push(DerivedTableRow::item(
            &format!("1.{}", idx + 1),
            label,
            field(splits, |s| s.with_tax),
        ));
    }
    operating_cost_table.push(DerivedTableRow::subtotal(
        "2",
        "进项税额",
        field(&combined, |s| s.input_tax),
    ));
    for (idx, (label, splits)) in categories.iter().enumerate() {
        operating_cost_table.push(DerivedTableRow::item(
            &format!("2.{}", idx + 1),
            label,
            field(splits, |s| s.input_tax),
        ));
    }
    operating_cost_table.push(DerivedTableRow::total(
        "3",
        "营业成本（除税）",
        field(&combined, |s| s.net_of_tax),
    ));

    // 总成本费用估算表
    let operating_cost = field(&combined, |s| s.net_of_tax);
    let input_tax = field(&combined, |s| s.input_tax);
    let management: Vec<Money> = (1..=years)
        .map(|y| management_year(&config.management, inputs.rates, y))
        .collect();
    let interest = sum_series(len, &[inputs.interest_expense]);
    let depreciation = depreciation_series(inputs.depreciation, len);
    let amortization = amortization_series(inputs.depreciation, len);
    let development = vec![Decimal::ZERO; len];
    let total_cost = sum_series(
        len,
        &[&operating_cost, &management, &interest, &depreciation, &amortization, &development],
    );

    let mut total_cost_table = DerivedTable::new(TOTAL_COST_TITLE, YearSpan::Operation);
    total_cost_table.push(DerivedTableRow::subtotal("1", "营业成本", operating_cost.clone()));
    for (idx, (label, splits)) in categories.iter().enumerate() {
        total_cost_table.push(DerivedTableRow::item(
            &format!("1.{}", idx + 1),
            label,
            field(splits, |s| s.net_of_tax),
        ));
    }
    total_cost_table.push(DerivedTableRow::item("2", "管理费用", management.clone()));
    total_cost_table.push(DerivedTableRow::item("3", "利息支出", interest.clone()));
    total_cost_table.push(DerivedTableRow::item("4", "折旧费", depreciation.clone()));
    total_cost_table.push(DerivedTableRow::item("5", "摊销费", amortization.clone()));
    total_cost_table.push(DerivedTableRow::item("6", "开发成本", development));
    total_cost_table.push(DerivedTableRow::total("7", "总成本费用合计", total_cost.clone()));

    // Detail tables
    let raw_materials_table = purchase_table(
        RAW_MATERIALS_TITLE,
        "外购原材料费",
        "除税后外购原材料费",
        &materials,
        &materials_total,
    );
    let fuel_power_table = purchase_table(
        FUEL_POWER_TITLE,
        "外购燃料及动力费",
        "除税后外购燃料及动力费",
        &fuels,
        &fuels_total,
    );

    let mut wages_table = DerivedTable::new(WAGES_TITLE, YearSpan::Operation);
    for (idx, (name, values)) in positions.iter().enumerate() {
        let code = (idx + 1).to_string();
        wages_table.push(DerivedTableRow::header(&code, name));
        wages_table.push(DerivedTableRow::item(
            &format!("{code}.1"),
            "工资",
            values.iter().map(|v| v.0).collect(),
        ));
        wages_table.push(DerivedTableRow::item(
            &format!("{code}.2"),
            "福利费",
            values.iter().map(|v| v.1).collect(),
        ));
    }
    let n = positions.len();
    wages_table.push(DerivedTableRow::subtotal(
        &(n + 1).to_string(),
        "工资合计",
        (0..len).map(|i| positions.iter().map(|(_, v)| v[i].0).sum()).collect(),
    ));
    wages_table.push(DerivedTableRow::subtotal(
        &(n + 2).to_string(),
        "福利费合计",
        (0..len).map(|i| positions.iter().map(|(_, v)| v[i].1).sum()).collect(),
    ));
    wages_table.push(DerivedTableRow::total(
        &(n + 3).to_string(),
        "工资及福利费合计",
        field(&wages_total, |s| s.with_tax),
    ));

    tracing::debug!(
        years,
        materials = materials.len(),
        fuels = fuels.len(),
        positions = n,
        "cost tables built"
    );

    CostOutput {
        operating_cost_table,
        total_cost_table,
        raw_materials_table,
        fuel_power_table,
        wages_table,
        operating_cost,
        input_tax,
        management,
        interest,
        depreciation,
        amortization,
        total_cost,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
