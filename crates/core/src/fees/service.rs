//! Fee validation and recalculation logic.
//!
//! This module provides the pure business rules for the fee lifecycle:
//! discount computation and authorization, payment validation, and the
//! recalculation of an assignment's derived totals. It has no database
//! dependencies; callers read the current ledger rows and pass them in.

use rust_decimal::Decimal;

use super::error::FeeError;
use super::types::{AssignmentTotals, DiscountType, PaymentStatus, RoleTier};

/// Policy knobs for discount authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountPolicy {
    /// Percentage value above which a discount requires an admin-tier caller.
    pub elevation_threshold_percent: Decimal,
}

impl Default for DiscountPolicy {
    fn default() -> Self {
        Self {
            elevation_threshold_percent: Decimal::from(20),
        }
    }
}

/// Stateless service holding the fee engine's pure rules.
pub struct FeeService;

impl FeeService {
    /// Validates the amount of a new charge snapshot.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::NegativeAmount` for amounts below zero.
    pub fn validate_charge_amount(amount: Decimal) -> Result<(), FeeError> {
        if amount < Decimal::ZERO {
            return Err(FeeError::NegativeAmount);
        }
        Ok(())
    }

    /// Validates the display name of a custom charge.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::EmptyChargeName` when the trimmed name is empty.
    pub fn validate_custom_name(name: &str) -> Result<(), FeeError> {
        if name.trim().is_empty() {
            return Err(FeeError::EmptyChargeName);
        }
        Ok(())
    }

    /// Computes the monetary amount of a discount.
    ///
    /// Percentage discounts are always computed against the assignment's
    /// original base amount; stacking percentage discounts does not compound.
    #[must_use]
    pub fn discount_amount(
        base_amount: Decimal,
        discount_type: DiscountType,
        value: Decimal,
    ) -> Decimal {
        match discount_type {
            DiscountType::Fixed => value,
            DiscountType::Percentage => base_amount * (value / Decimal::ONE_HUNDRED),
        }
    }

    /// Validates a discount grant and returns its calculated amount.
    ///
    /// Checks run in this order: component allows discounts, value is
    /// non-negative, percentage elevation threshold, aggregate cap against
    /// the base amount.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::DiscountNotAllowed`, `FeeError::NegativeAmount`,
    /// `FeeError::DiscountRequiresElevation`, or `FeeError::OverDiscount`.
    pub fn validate_discount(
        base_amount: Decimal,
        existing_active_discount_total: Decimal,
        allow_discount: bool,
        discount_type: DiscountType,
        value: Decimal,
        caller: RoleTier,
        policy: &DiscountPolicy,
    ) -> Result<Decimal, FeeError> {
        if !allow_discount {
            return Err(FeeError::DiscountNotAllowed);
        }
        if value < Decimal::ZERO {
            return Err(FeeError::NegativeAmount);
        }
        if discount_type == DiscountType::Percentage
            && value > policy.elevation_threshold_percent
            && !caller.is_admin()
        {
            return Err(FeeError::DiscountRequiresElevation {
                value,
                threshold: policy.elevation_threshold_percent,
            });
        }

        let calculated = Self::discount_amount(base_amount, discount_type, value);
        if existing_active_discount_total + calculated > base_amount {
            return Err(FeeError::OverDiscount {
                requested: calculated,
                available: base_amount - existing_active_discount_total,
            });
        }

        Ok(calculated)
    }

    /// Validates a payment against the assignment's remaining balance.
    ///
    /// # Errors
    ///
    /// Returns `FeeError::NonPositivePayment` or `FeeError::Overpayment`.
    pub fn validate_payment(
        amount_paid: Decimal,
        final_amount: Decimal,
        total_paid_so_far: Decimal,
    ) -> Result<(), FeeError> {
        if amount_paid <= Decimal::ZERO {
            return Err(FeeError::NonPositivePayment);
        }
        let balance = final_amount - total_paid_so_far;
        if amount_paid > balance {
            return Err(FeeError::Overpayment {
                requested: amount_paid,
                balance,
            });
        }
        Ok(())
    }

    /// Recalculates an assignment's derived totals from its ledgers.
    ///
    /// Deterministic and side-effect free; running it twice over the same
    /// inputs yields the same totals.
    #[must_use]
    pub fn recalculate(
        base_amount: Decimal,
        active_discount_amounts: &[Decimal],
        successful_payment_amounts: &[Decimal],
    ) -> AssignmentTotals {
        let total_discount: Decimal = active_discount_amounts.iter().copied().sum();
        let final_amount = (base_amount - total_discount).max(Decimal::ZERO);
        let total_paid: Decimal = successful_payment_amounts.iter().copied().sum();

        AssignmentTotals {
            total_discount,
            final_amount,
            total_paid,
            status: Self::derive_status(total_paid, final_amount),
        }
    }

    /// Derives the three-way payment status.
    #[must_use]
    pub fn derive_status(total_paid: Decimal, final_amount: Decimal) -> PaymentStatus {
        if total_paid >= final_amount {
            PaymentStatus::Paid
        } else if total_paid > Decimal::ZERO {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Unpaid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn policy() -> DiscountPolicy {
        DiscountPolicy::default()
    }

    // A freshly assigned mandatory template: base 1000, no ledger activity.
    #[test]
    fn test_fresh_assignment_totals() {
        let totals = FeeService::recalculate(dec!(1000), &[], &[]);
        assert_eq!(totals.total_discount, dec!(0));
        assert_eq!(totals.final_amount, dec!(1000));
        assert_eq!(totals.total_paid, dec!(0));
        assert_eq!(totals.status, PaymentStatus::Unpaid);
    }

    // 15% discount on base 1000: calculated 150, final 850, still unpaid.
    #[test]
    fn test_percentage_discount_recalculation() {
        let calc = FeeService::validate_discount(
            dec!(1000),
            dec!(0),
            true,
            DiscountType::Percentage,
            dec!(15),
            RoleTier::Staff,
            &policy(),
        )
        .unwrap();
        assert_eq!(calc, dec!(150.00));

        let totals = FeeService::recalculate(dec!(1000), &[calc], &[]);
        assert_eq!(totals.total_discount, dec!(150.00));
        assert_eq!(totals.final_amount, dec!(850.00));
        assert_eq!(totals.status, PaymentStatus::Unpaid);
    }

    // Paying the full 850 flips the status to paid and zeroes the balance.
    #[test]
    fn test_full_payment_then_overpayment_rejected() {
        let final_amount = dec!(850);
        FeeService::validate_payment(dec!(850), final_amount, dec!(0)).unwrap();

        let totals = FeeService::recalculate(dec!(1000), &[dec!(150)], &[dec!(850)]);
        assert_eq!(totals.status, PaymentStatus::Paid);
        assert_eq!(totals.balance(), dec!(0));

        let result = FeeService::validate_payment(dec!(0.01), final_amount, dec!(850));
        assert!(matches!(result, Err(FeeError::Overpayment { .. })));
    }

    // 25% as a non-admin fails; totals are untouched because nothing persisted.
    #[test]
    fn test_high_percentage_requires_admin() {
        let result = FeeService::validate_discount(
            dec!(1000),
            dec!(0),
            true,
            DiscountType::Percentage,
            dec!(25),
            RoleTier::Staff,
            &policy(),
        );
        assert!(matches!(
            result,
            Err(FeeError::DiscountRequiresElevation { .. })
        ));

        let admin = FeeService::validate_discount(
            dec!(1000),
            dec!(0),
            true,
            DiscountType::Percentage,
            dec!(25),
            RoleTier::Admin,
            &policy(),
        );
        assert_eq!(admin.unwrap(), dec!(250.00));
    }

    // Paying 400 of 1000 leaves a partial status and a 600 balance.
    #[test]
    fn test_partial_payment() {
        FeeService::validate_payment(dec!(400), dec!(1000), dec!(0)).unwrap();
        let totals = FeeService::recalculate(dec!(1000), &[], &[dec!(400)]);
        assert_eq!(totals.status, PaymentStatus::Partial);
        assert_eq!(totals.balance(), dec!(600));
    }

    // Deactivating a 150 discount on a partially paid assignment restores
    // the base, keeps the 400 already paid, and stays partial.
    #[test]
    fn test_discount_deactivation_recalculates() {
        let before = FeeService::recalculate(dec!(1000), &[dec!(150)], &[dec!(400)]);
        assert_eq!(before.final_amount, dec!(850));
        assert_eq!(before.status, PaymentStatus::Partial);

        let after = FeeService::recalculate(dec!(1000), &[], &[dec!(400)]);
        assert_eq!(after.final_amount, dec!(1000));
        assert_eq!(after.balance(), dec!(600));
        assert_eq!(after.status, PaymentStatus::Partial);
    }

    #[test]
    fn test_fixed_discount_amount() {
        assert_eq!(
            FeeService::discount_amount(dec!(1000), DiscountType::Fixed, dec!(200)),
            dec!(200)
        );
    }

    // Two stacked 10% discounts each compute from the original base.
    #[test]
    fn test_percentage_discounts_do_not_compound() {
        let first =
            FeeService::discount_amount(dec!(1000), DiscountType::Percentage, dec!(10));
        assert_eq!(first, dec!(100.0));

        let second = FeeService::validate_discount(
            dec!(1000),
            first,
            true,
            DiscountType::Percentage,
            dec!(10),
            RoleTier::Staff,
            &policy(),
        )
        .unwrap();
        // Not 90: the second discount ignores the first when computing.
        assert_eq!(second, dec!(100.0));

        let totals = FeeService::recalculate(dec!(1000), &[first, second], &[]);
        assert_eq!(totals.final_amount, dec!(800.0));
    }

    #[test]
    fn test_over_discount_rejected() {
        let result = FeeService::validate_discount(
            dec!(1000),
            dec!(900),
            true,
            DiscountType::Fixed,
            dec!(200),
            RoleTier::Admin,
            &policy(),
        );
        assert!(matches!(result, Err(FeeError::OverDiscount { .. })));
    }

    #[test]
    fn test_discount_exactly_at_cap_allowed() {
        let calc = FeeService::validate_discount(
            dec!(1000),
            dec!(900),
            true,
            DiscountType::Fixed,
            dec!(100),
            RoleTier::Staff,
            &policy(),
        );
        assert_eq!(calc.unwrap(), dec!(100));
    }

    #[test]
    fn test_discount_disallowed_component() {
        let result = FeeService::validate_discount(
            dec!(1000),
            dec!(0),
            false,
            DiscountType::Fixed,
            dec!(10),
            RoleTier::Admin,
            &policy(),
        );
        assert!(matches!(result, Err(FeeError::DiscountNotAllowed)));
    }

    #[test]
    fn test_negative_discount_value_rejected() {
        let result = FeeService::validate_discount(
            dec!(1000),
            dec!(0),
            true,
            DiscountType::Fixed,
            dec!(-5),
            RoleTier::Admin,
            &policy(),
        );
        assert!(matches!(result, Err(FeeError::NegativeAmount)));
    }

    #[test]
    fn test_threshold_is_configurable() {
        let strict = DiscountPolicy {
            elevation_threshold_percent: dec!(5),
        };
        let result = FeeService::validate_discount(
            dec!(1000),
            dec!(0),
            true,
            DiscountType::Percentage,
            dec!(10),
            RoleTier::Staff,
            &strict,
        );
        assert!(matches!(
            result,
            Err(FeeError::DiscountRequiresElevation { .. })
        ));
    }

    // Fixed discounts above 20% of base need no elevation; the threshold
    // applies to percentage values only.
    #[test]
    fn test_fixed_discount_skips_elevation_check() {
        let calc = FeeService::validate_discount(
            dec!(1000),
            dec!(0),
            true,
            DiscountType::Fixed,
            dec!(500),
            RoleTier::Staff,
            &policy(),
        );
        assert_eq!(calc.unwrap(), dec!(500));
    }

    #[test]
    fn test_zero_payment_rejected() {
        let result = FeeService::validate_payment(dec!(0), dec!(1000), dec!(0));
        assert!(matches!(result, Err(FeeError::NonPositivePayment)));

        let result = FeeService::validate_payment(dec!(-10), dec!(1000), dec!(0));
        assert!(matches!(result, Err(FeeError::NonPositivePayment)));
    }

    #[test]
    fn test_payment_exactly_at_balance_allowed() {
        assert!(FeeService::validate_payment(dec!(600), dec!(1000), dec!(400)).is_ok());
    }

    #[test]
    fn test_fully_discounted_assignment_is_paid_with_no_payments() {
        let totals = FeeService::recalculate(dec!(1000), &[dec!(1000)], &[]);
        assert_eq!(totals.final_amount, dec!(0));
        assert_eq!(totals.status, PaymentStatus::Paid);
    }

    #[test]
    fn test_final_amount_never_negative() {
        // Aggregate discounts can exceed base only through deactivation
        // ordering edge cases; the formula still clamps at zero.
        let totals = FeeService::recalculate(dec!(100), &[dec!(80), dec!(80)], &[]);
        assert_eq!(totals.final_amount, dec!(0));
    }

    #[test]
    fn test_charge_amount_validation() {
        assert!(FeeService::validate_charge_amount(dec!(0)).is_ok());
        assert!(FeeService::validate_charge_amount(dec!(150.50)).is_ok());
        assert!(matches!(
            FeeService::validate_charge_amount(dec!(-1)),
            Err(FeeError::NegativeAmount)
        ));
    }

    #[test]
    fn test_custom_name_validation() {
        assert!(FeeService::validate_custom_name("Library fine").is_ok());
        assert!(matches!(
            FeeService::validate_custom_name("   "),
            Err(FeeError::EmptyChargeName)
        ));
    }

    #[test]
    fn test_status_derivation_boundaries() {
        assert_eq!(
            FeeService::derive_status(dec!(0), dec!(100)),
            PaymentStatus::Unpaid
        );
        assert_eq!(
            FeeService::derive_status(dec!(0.01), dec!(100)),
            PaymentStatus::Partial
        );
        assert_eq!(
            FeeService::derive_status(dec!(100), dec!(100)),
            PaymentStatus::Paid
        );
        assert_eq!(
            FeeService::derive_status(dec!(0), dec!(0)),
            PaymentStatus::Paid
        );
    }
}
