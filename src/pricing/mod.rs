//! Order pricing and material-usage engine.
//!
//! Pure, deterministic computation over an order draft and a read-only
//! snapshot of the material catalog: per-piece material consumption from
//! the item's dimensions, order subtotal/discount/total, and reconciliation
//! of the installment plan against the computed total. No I/O and no shared
//! state; callers pass everything in and the same inputs always produce the
//! same outputs.
//!
//! All money and quantity arithmetic uses `rust_decimal::Decimal` at full
//! precision. Rounding to two decimal places happens only when a value is
//! formatted for a document, never between computations.

use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

use crate::entities::material::{self, UnitOfMeasure};
use crate::entities::order::DiscountType;
use crate::entities::order_item::MaterialSelections;

const CM_PER_METER: Decimal = Decimal::ONE_HUNDRED;

/// Read-only view of the material catalog for one engine invocation.
///
/// The engine never reaches into storage; the caller takes a snapshot of
/// whatever materials the draft references and hands it in.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    materials: HashMap<Uuid, material::Model>,
}

impl CatalogSnapshot {
    pub fn from_models(models: impl IntoIterator<Item = material::Model>) -> Self {
        Self {
            materials: models.into_iter().map(|m| (m.id, m)).collect(),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&material::Model> {
        self.materials.get(&id)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }
}

/// Per-piece consumption of a material by an item of the given dimensions.
///
/// Dimensions arrive in centimeters and are converted to meters:
/// linear-meter materials consume the perimeter `2 * (w + h)`, square-meter
/// materials the area `w * h`, and sheet/unit materials a constant `1`
/// regardless of size. Non-positive dimensions are not rejected here; they
/// propagate arithmetically. Positivity is validated at the service
/// boundary before the engine is invoked.
pub fn usage_per_piece(width_cm: Decimal, height_cm: Decimal, unit: UnitOfMeasure) -> Decimal {
    let width_m = width_cm / CM_PER_METER;
    let height_m = height_cm / CM_PER_METER;

    match unit {
        UnitOfMeasure::LinearMeter => Decimal::TWO * (width_m + height_m),
        UnitOfMeasure::SquareMeter => width_m * height_m,
        UnitOfMeasure::Sheet | UnitOfMeasure::Unit => Decimal::ONE,
    }
}

/// Total consumption of a material by an item: per-piece usage times the
/// number of identical pieces. This is the figure stock deduction uses.
pub fn total_consumption(usage_per_piece: Decimal, quantity: i32) -> Decimal {
    usage_per_piece * Decimal::from(quantity)
}

/// Refreshes the stored per-piece usage of every selection against the
/// item's current dimensions.
///
/// Incremental edits can leave stale `quantity_used` values behind (the
/// width changed after the material was picked), so this runs on every item
/// edit and once more as a final normalization pass at submission time.
/// Selections referencing a material absent from the snapshot are left
/// untouched.
pub fn normalize_selections(
    width_cm: Decimal,
    height_cm: Decimal,
    selections: &mut MaterialSelections,
    catalog: &CatalogSnapshot,
) {
    for selection in selections.0.values_mut() {
        if let Some(material) = catalog.get(selection.material_id) {
            selection.quantity_used = usage_per_piece(width_cm, height_cm, material.unit);
        }
    }
}

/// A line's contribution to the order subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricedLine {
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl PricedLine {
    pub fn line_total(self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Discount applied once to the order subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discount {
    pub kind: DiscountType,
    pub value: Decimal,
}

impl Discount {
    pub fn none() -> Self {
        Self {
            kind: DiscountType::Fixed,
            value: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
}

/// Computes subtotal, discount amount, and total for an order.
///
/// A percentage discount takes `value / 100` of the subtotal; a fixed
/// discount is applied as-is and is deliberately not clamped, so a fixed
/// discount larger than the subtotal yields a negative total. That is
/// accepted behavior, not an error.
pub fn order_totals(lines: &[PricedLine], discount: Discount) -> OrderTotals {
    let subtotal: Decimal = lines.iter().map(|line| line.line_total()).sum();

    let discount_amount = match discount.kind {
        DiscountType::Percentage => subtotal * (discount.value / Decimal::ONE_HUNDRED),
        DiscountType::Fixed => discount.value,
    };

    OrderTotals {
        subtotal,
        discount_amount,
        total: subtotal - discount_amount,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentPlan {
    pub installments_total: Decimal,
    /// Informational signal for the caller; a non-zero remainder never
    /// blocks saving the order.
    pub remaining_to_pay: Decimal,
}

/// Reconciles the installment plan against the order total.
pub fn reconcile_installments(total: Decimal, amounts: &[Decimal]) -> PaymentPlan {
    let installments_total: Decimal = amounts.iter().copied().sum();
    PaymentPlan {
        installments_total,
        remaining_to_pay: total - installments_total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::material::MaterialCategory;
    use crate::entities::order_item::MaterialSelection;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use test_case::test_case;

    fn material(unit: UnitOfMeasure) -> material::Model {
        material::Model {
            id: Uuid::new_v4(),
            code: "M-001".into(),
            name: "Test material".into(),
            category: MaterialCategory::Frame,
            unit,
            stock: dec!(100),
            description: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn perimeter_usage_for_linear_meter() {
        // 60x80 cm frame: 2 * (0.6 + 0.8) = 2.8 linear meters.
        let usage = usage_per_piece(dec!(60), dec!(80), UnitOfMeasure::LinearMeter);
        assert_eq!(usage, dec!(2.8));
    }

    #[test]
    fn area_usage_for_square_meter() {
        let usage = usage_per_piece(dec!(60), dec!(80), UnitOfMeasure::SquareMeter);
        assert_eq!(usage, dec!(0.48));
    }

    #[test_case(UnitOfMeasure::Sheet; "sheet")]
    #[test_case(UnitOfMeasure::Unit; "unit count")]
    fn whole_piece_materials_ignore_dimensions(unit: UnitOfMeasure) {
        assert_eq!(usage_per_piece(dec!(60), dec!(80), unit), Decimal::ONE);
        assert_eq!(usage_per_piece(dec!(300), dec!(5), unit), Decimal::ONE);
    }

    #[test]
    fn usage_is_deterministic() {
        let first = usage_per_piece(dec!(42.5), dec!(13.3), UnitOfMeasure::LinearMeter);
        let second = usage_per_piece(dec!(42.5), dec!(13.3), UnitOfMeasure::LinearMeter);
        assert_eq!(first, second);
    }

    #[test]
    fn consumption_scales_with_quantity() {
        assert_eq!(total_consumption(dec!(2.8), 3), dec!(8.4));
    }

    #[test]
    fn normalization_refreshes_stale_usage() {
        let glass = material(UnitOfMeasure::SquareMeter);
        let catalog = CatalogSnapshot::from_models([glass.clone()]);

        let mut selections = MaterialSelections::default();
        selections.select(
            MaterialCategory::Glass,
            MaterialSelection {
                material_id: glass.id,
                // Stale value from before the dimensions were edited.
                quantity_used: dec!(99),
            },
        );

        normalize_selections(dec!(60), dec!(80), &mut selections, &catalog);
        let refreshed = &selections.0[&MaterialCategory::Glass];
        assert_eq!(refreshed.quantity_used, dec!(0.48));
    }

    #[test]
    fn normalization_leaves_unknown_materials_alone() {
        let catalog = CatalogSnapshot::default();
        let mut selections = MaterialSelections::default();
        selections.select(
            MaterialCategory::Frame,
            MaterialSelection {
                material_id: Uuid::new_v4(),
                quantity_used: dec!(7),
            },
        );

        normalize_selections(dec!(60), dec!(80), &mut selections, &catalog);
        assert_eq!(
            selections.0[&MaterialCategory::Frame].quantity_used,
            dec!(7)
        );
    }

    #[test]
    fn selecting_a_category_replaces_prior_selection() {
        let mut selections = MaterialSelections::default();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        selections.select(
            MaterialCategory::Frame,
            MaterialSelection {
                material_id: first,
                quantity_used: Decimal::ONE,
            },
        );
        selections.select(
            MaterialCategory::Frame,
            MaterialSelection {
                material_id: second,
                quantity_used: Decimal::ONE,
            },
        );

        assert_eq!(selections.0.len(), 1);
        assert_eq!(selections.0[&MaterialCategory::Frame].material_id, second);
    }

    #[test]
    fn subtotal_is_order_independent() {
        let a = PricedLine {
            unit_price: dec!(100),
            quantity: 2,
        };
        let b = PricedLine {
            unit_price: dec!(50),
            quantity: 1,
        };

        let forward = order_totals(&[a, b], Discount::none());
        let reversed = order_totals(&[b, a], Discount::none());

        assert_eq!(forward.subtotal, dec!(250));
        assert_eq!(forward.subtotal, reversed.subtotal);
    }

    #[test]
    fn percentage_discount() {
        let lines = [
            PricedLine {
                unit_price: dec!(100),
                quantity: 2,
            },
            PricedLine {
                unit_price: dec!(50),
                quantity: 1,
            },
        ];
        let totals = order_totals(
            &lines,
            Discount {
                kind: DiscountType::Percentage,
                value: dec!(10),
            },
        );

        assert_eq!(totals.subtotal, dec!(250));
        assert_eq!(totals.discount_amount, dec!(25));
        assert_eq!(totals.total, dec!(225));
    }

    #[test]
    fn fixed_discount_may_exceed_subtotal() {
        let lines = [PricedLine {
            unit_price: dec!(100),
            quantity: 1,
        }];
        let totals = order_totals(
            &lines,
            Discount {
                kind: DiscountType::Fixed,
                value: dec!(150),
            },
        );

        assert_eq!(totals.total, dec!(-50));
    }

    #[test]
    fn installment_reconciliation() {
        let plan = reconcile_installments(dec!(225), &[dec!(100), dec!(100)]);
        assert_eq!(plan.installments_total, dec!(200));
        assert_eq!(plan.remaining_to_pay, dec!(25));
    }

    #[test]
    fn empty_installment_plan_leaves_full_total_open() {
        let plan = reconcile_installments(dec!(225), &[]);
        assert_eq!(plan.installments_total, Decimal::ZERO);
        assert_eq!(plan.remaining_to_pay, dec!(225));
    }
}
