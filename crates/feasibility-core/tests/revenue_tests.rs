use feasibility_core::production_rate::{ProductionRate, ProductionRateSchedule};
use feasibility_core::revenue::{
    build_revenue, PriceEscalation, PriceUnit, RevenueItem, RevenueTemplate,
};
use feasibility_core::types::ProjectContext;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn context(construction_years: u32, operation_years: u32) -> ProjectContext {
    ProjectContext {
        construction_years,
        operation_years,
        total_investment: dec!(1000),
    }
}

fn quantity_item(id: &str, quantity: Decimal, unit_price: Decimal) -> RevenueItem {
    RevenueItem {
        id: id.into(),
        name: format!("Item {id}"),
        template: RevenueTemplate::QuantityPrice {
            quantity,
            unit_price,
        },
        price_unit: PriceUnit::WanYuan,
        vat_rate: dec!(0.13),
        escalation: None,
        apply_production_rate: true,
    }
}

// ===========================================================================
// Output tax split
// ===========================================================================

#[test]
fn test_revenue_output_tax_split() {
    // 100 tax-inclusive at 13%: output tax 100 - 100/1.13 = 11.50, net 88.50
    let out = build_revenue(
        &context(2, 3),
        &[quantity_item("r1", dec!(100), dec!(1))],
        &ProductionRateSchedule::default(),
    );
    assert_eq!(out.tax_inclusive, vec![dec!(100); 3]);
    for year in 0..3 {
        assert_eq!(out.output_tax[year].round_dp(2), dec!(11.50));
        assert_eq!(out.net_revenue[year].round_dp(2), dec!(88.50));
    }
}

#[test]
fn test_revenue_table_totals_are_row_sums() {
    let items = vec![
        quantity_item("r1", dec!(100), dec!(1)),
        quantity_item("r2", dec!(40), dec!(2.5)),
    ];
    let out = build_revenue(&context(1, 6), &items, &ProductionRateSchedule::ramp_up(6));
    assert!(out.table.verify_totals().is_empty());
    assert_eq!(out.table.values("1").len(), 6);
    assert_eq!(out.table.value("1", 5), dec!(200));
}

// ===========================================================================
// Production rate
// ===========================================================================

#[test]
fn test_production_rate_scales_revenue() {
    let rates = ProductionRateSchedule::new(vec![
        ProductionRate {
            year_index: 1,
            rate: dec!(0.6),
        },
        ProductionRate {
            year_index: 2,
            rate: dec!(0.9),
        },
    ]);
    let out = build_revenue(&context(1, 3), &[quantity_item("r1", dec!(100), dec!(1))], &rates);
    assert_eq!(out.tax_inclusive, vec![dec!(60), dec!(90), dec!(100)]);
}

#[test]
fn test_production_rate_of_one_is_neutral() {
    let items = vec![quantity_item("r1", dec!(120), dec!(3))];
    let unit = ProductionRateSchedule::new(
        (1..=4)
            .map(|year_index| ProductionRate {
                year_index,
                rate: Decimal::ONE,
            })
            .collect(),
    );
    let with_curve = build_revenue(&context(2, 4), &items, &unit);
    let without = build_revenue(&context(2, 4), &items, &ProductionRateSchedule::default());
    assert_eq!(with_curve.tax_inclusive, without.tax_inclusive);
    assert_eq!(with_curve.net_revenue, without.net_revenue);
}

#[test]
fn test_item_opted_out_of_ramp_up() {
    let mut item = quantity_item("r1", dec!(100), dec!(1));
    item.apply_production_rate = false;
    let out = build_revenue(&context(1, 3), &[item], &ProductionRateSchedule::ramp_up(3));
    assert_eq!(out.tax_inclusive, vec![dec!(100); 3]);
}

// ===========================================================================
// Templates, units and escalation
// ===========================================================================

#[test]
fn test_yuan_prices_are_converted() {
    let mut item = quantity_item("r1", dec!(5000), dec!(20));
    item.price_unit = PriceUnit::Yuan;
    let out = build_revenue(&context(0, 1), &[item], &ProductionRateSchedule::default());
    assert_eq!(out.tax_inclusive, vec![dec!(10)]);
}

#[test]
fn test_price_escalation_steps() {
    let mut item = quantity_item("r1", dec!(100), dec!(1));
    item.escalation = Some(PriceEscalation {
        rate: dec!(10),
        interval_years: 2,
    });
    let out = build_revenue(&context(0, 5), &[item], &ProductionRateSchedule::default());
    assert_eq!(
        out.tax_inclusive,
        vec![dec!(100), dec!(100), dec!(110), dec!(110), dec!(121)]
    );
}

#[test]
fn test_area_yield_template() {
    let item = RevenueItem {
        template: RevenueTemplate::AreaYieldPrice {
            area: dec!(200),
            yield_per_area: dec!(0.5),
            unit_price: dec!(0.3),
        },
        ..quantity_item("farm", Decimal::ZERO, Decimal::ZERO)
    };
    let out = build_revenue(&context(0, 1), &[item], &ProductionRateSchedule::default());
    assert_eq!(out.tax_inclusive, vec![dec!(30)]);
}

#[test]
fn test_zero_operation_years_gives_empty_series() {
    let out = build_revenue(
        &context(2, 0),
        &[quantity_item("r1", dec!(100), dec!(1))],
        &ProductionRateSchedule::default(),
    );
    assert!(out.net_revenue.is_empty());
}

#[test]
fn test_revenue_item_from_json() {
    let item: RevenueItem = serde_json::from_str(
        r#"{
            "id": "r1",
            "name": "Steel",
            "template": {"type": "QuantityPrice", "quantity": "100", "unit_price": "1"},
            "vat_rate": "0.13"
        }"#,
    )
    .unwrap();
    assert!(item.apply_production_rate);
    assert_eq!(item.price_unit, PriceUnit::WanYuan);
    assert_eq!(item.steady_state_revenue(1), dec!(100));
}
