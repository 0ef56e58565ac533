//! Property-based tests for the fee recalculation rules.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::{DiscountPolicy, FeeService};
use super::types::{DiscountType, PaymentStatus, RoleTier};

/// Strategy to generate a money amount from 0.00 to 1,000,000.00.
fn money() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a positive money amount.
fn positive_money() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a small list of money amounts.
fn money_list() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec(money(), 0..8)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The final amount always equals max(0, base - total discount).
    #[test]
    fn prop_final_amount_formula(
        base in money(),
        discounts in money_list(),
        payments in money_list(),
    ) {
        let totals = FeeService::recalculate(base, &discounts, &payments);
        let expected_discount: Decimal = discounts.iter().copied().sum();
        let expected_final = (base - expected_discount).max(Decimal::ZERO);

        prop_assert_eq!(totals.total_discount, expected_discount);
        prop_assert_eq!(totals.final_amount, expected_final);
        prop_assert!(totals.final_amount >= Decimal::ZERO);
    }

    /// Status is exactly the three-way partition of total paid vs final.
    #[test]
    fn prop_status_partition(
        base in money(),
        discounts in money_list(),
        payments in money_list(),
    ) {
        let totals = FeeService::recalculate(base, &discounts, &payments);

        match totals.status {
            PaymentStatus::Paid => prop_assert!(totals.total_paid >= totals.final_amount),
            PaymentStatus::Partial => prop_assert!(
                totals.total_paid > Decimal::ZERO && totals.total_paid < totals.final_amount
            ),
            PaymentStatus::Unpaid => prop_assert!(totals.total_paid == Decimal::ZERO),
        }
    }

    /// Recalculation is idempotent: the same inputs always give the same totals.
    #[test]
    fn prop_recalculation_idempotent(
        base in money(),
        discounts in money_list(),
        payments in money_list(),
    ) {
        let first = FeeService::recalculate(base, &discounts, &payments);
        let second = FeeService::recalculate(base, &discounts, &payments);
        prop_assert_eq!(first, second);
    }

    /// A validated discount never pushes the active total above the base.
    #[test]
    fn prop_discount_cap_holds(
        base in positive_money(),
        existing in money(),
        value in money(),
    ) {
        let result = FeeService::validate_discount(
            base,
            existing,
            true,
            DiscountType::Fixed,
            value,
            RoleTier::Admin,
            &DiscountPolicy::default(),
        );

        if let Ok(calculated) = result {
            prop_assert!(existing + calculated <= base);
        }
    }

    /// A validated payment never pushes the paid total above the final amount.
    #[test]
    fn prop_no_overpayment(
        final_amount in money(),
        already_paid in money(),
        amount in positive_money(),
    ) {
        let result = FeeService::validate_payment(amount, final_amount, already_paid);
        if result.is_ok() {
            prop_assert!(already_paid + amount <= final_amount);
        }
    }

    /// Percentage discounts compute from the base alone, independent of
    /// any discounts already granted.
    #[test]
    fn prop_percentage_independent_of_existing(
        base in positive_money(),
        existing in money(),
        value in (0i64..=2000i64).prop_map(|v| Decimal::new(v, 2)),
    ) {
        let alone = FeeService::discount_amount(base, DiscountType::Percentage, value);
        let result = FeeService::validate_discount(
            base,
            existing,
            true,
            DiscountType::Percentage,
            value,
            RoleTier::Admin,
            &DiscountPolicy::default(),
        );

        if let Ok(calculated) = result {
            prop_assert_eq!(calculated, alone);
        }
    }
}
