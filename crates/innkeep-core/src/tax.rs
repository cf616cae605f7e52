//! # Tax Module
//!
//! GST rates and the intra/inter-state rule.
//!
//! ## One Rule For Every Taxed Total
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stay.state == profile.state ?  (exact, case-sensitive)                │
//! │        │                                                                │
//! │        ├── yes → IntraState: total = base × (1 + (sgst + cgst) / 100)   │
//! │        │                                                                │
//! │        └── no  → InterState: total = base × (1 + igst / 100)            │
//! │                              igst = sgst + cgst                         │
//! │                                                                         │
//! │  Room categories and menu items carry ONE combined GST rate that is    │
//! │  split into equal halves. Line items store sgst and cgst separately,   │
//! │  so an operator may enter asymmetric rates by hand.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 600 bps = 6% and 250 bps = 2.5%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage such as `6.0` or `2.5`.
    ///
    /// Used when reading the legacy `taxList` pairs, which hold percentages.
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round().max(0.0) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display and legacy views).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Tax Regime
// =============================================================================

/// Whether a stay is taxed as intra-state (SGST + CGST) or inter-state (IGST).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TaxRegime {
    #[default]
    IntraState,
    InterState,
}

impl TaxRegime {
    /// Selects the regime by comparing the guest's state with the tenant's.
    ///
    /// No normalization: `"Goa"` and `"goa"` are different states. A stay
    /// without a state is billed as local.
    ///
    /// ```rust
    /// use innkeep_core::tax::TaxRegime;
    ///
    /// assert_eq!(TaxRegime::for_states(Some("Goa"), "Goa"), TaxRegime::IntraState);
    /// assert_eq!(TaxRegime::for_states(Some("goa"), "Goa"), TaxRegime::InterState);
    /// assert_eq!(TaxRegime::for_states(None, "Goa"), TaxRegime::IntraState);
    /// ```
    pub fn for_states(stay_state: Option<&str>, tenant_state: &str) -> Self {
        match stay_state {
            None => TaxRegime::IntraState,
            Some(s) if s.is_empty() || s == tenant_state => TaxRegime::IntraState,
            Some(_) => TaxRegime::InterState,
        }
    }
}

// =============================================================================
// GST Rate
// =============================================================================

/// A pair of SGST/CGST rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GstRate {
    pub sgst: TaxRate,
    pub cgst: TaxRate,
}

impl GstRate {
    /// Creates a rate pair from separate SGST and CGST rates.
    pub const fn new(sgst: TaxRate, cgst: TaxRate) -> Self {
        GstRate { sgst, cgst }
    }

    /// Splits a combined GST rate into equal halves.
    ///
    /// For an odd number of basis points CGST takes the extra one, so the
    /// halves always add back up to the combined rate.
    ///
    /// ```rust
    /// use innkeep_core::tax::{GstRate, TaxRate};
    ///
    /// let gst = GstRate::from_combined(TaxRate::from_bps(1200));
    /// assert_eq!(gst.sgst.bps(), 600);
    /// assert_eq!(gst.cgst.bps(), 600);
    /// ```
    pub fn from_combined(gst: TaxRate) -> Self {
        let sgst = gst.bps() / 2;
        GstRate {
            sgst: TaxRate::from_bps(sgst),
            cgst: TaxRate::from_bps(gst.bps() - sgst),
        }
    }

    /// Combined rate, which is also the IGST rate for inter-state stays.
    pub fn combined(&self) -> TaxRate {
        TaxRate::from_bps(self.sgst.bps() + self.cgst.bps())
    }

    /// Applies the rate to `base` under `regime`.
    ///
    /// The combined tax is rounded once, then split: SGST is rounded on its
    /// own and CGST takes the remainder, so the components always sum to
    /// `total - base`.
    pub fn apply(&self, base: Money, regime: TaxRegime) -> TaxBreakdown {
        let tax = base.calculate_tax(self.combined());

        match regime {
            TaxRegime::IntraState => {
                let sgst = base.calculate_tax(self.sgst).min(tax);
                TaxBreakdown {
                    base,
                    sgst,
                    cgst: tax - sgst,
                    igst: Money::zero(),
                    total: base + tax,
                }
            }
            TaxRegime::InterState => TaxBreakdown {
                base,
                sgst: Money::zero(),
                cgst: Money::zero(),
                igst: tax,
                total: base + tax,
            },
        }
    }
}

// =============================================================================
// Tax Breakdown
// =============================================================================

/// Result of applying a GST rate to a base amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub base: Money,
    pub sgst: Money,
    pub cgst: Money,
    pub igst: Money,
    pub total: Money,
}

impl TaxBreakdown {
    /// Total tax (all components).
    pub fn tax(&self) -> Money {
        self.sgst + self.cgst + self.igst
    }

    /// Adds another breakdown component-wise.
    pub fn accumulate(&mut self, other: &TaxBreakdown) {
        self.base += other.base;
        self.sgst += other.sgst;
        self.cgst += other.cgst;
        self.igst += other.igst;
        self.total += other.total;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(6.0).bps(), 600);
        assert_eq!(TaxRate::from_percentage(2.5).bps(), 250);
        assert!((TaxRate::from_bps(900).percentage() - 9.0).abs() < 0.001);
    }

    #[test]
    fn test_split_odd_rate() {
        let gst = GstRate::from_combined(TaxRate::from_bps(25));
        assert_eq!(gst.sgst.bps() + gst.cgst.bps(), 25);
        assert_eq!(gst.cgst.bps(), 13);
    }

    #[test]
    fn test_intra_state_item_total() {
        // ₹100 × 2 at 6% + 6% = ₹224.00
        let gst = GstRate::new(TaxRate::from_bps(600), TaxRate::from_bps(600));
        let b = gst.apply(Money::from_rupees(200), TaxRegime::IntraState);

        assert_eq!(b.total, Money::from_rupees(224));
        assert_eq!(b.sgst, Money::from_rupees(12));
        assert_eq!(b.cgst, Money::from_rupees(12));
        assert!(b.igst.is_zero());
    }

    #[test]
    fn test_inter_state_uses_igst() {
        let gst = GstRate::from_combined(TaxRate::from_bps(1800));
        let b = gst.apply(Money::from_rupees(1000), TaxRegime::InterState);

        assert_eq!(b.igst, Money::from_rupees(180));
        assert!(b.sgst.is_zero() && b.cgst.is_zero());
        assert_eq!(b.total, Money::from_rupees(1180));
    }

    #[test]
    fn test_components_sum_to_tax_with_rounding() {
        // 333 paise at 2.5% + 2.5%: combined 16.65 → 17, sgst 8.325 → 8
        let gst = GstRate::from_combined(TaxRate::from_bps(500));
        let b = gst.apply(Money::from_paise(333), TaxRegime::IntraState);

        assert_eq!(b.tax().paise(), 17);
        assert_eq!(b.sgst.paise(), 8);
        assert_eq!(b.cgst.paise(), 9);
        assert_eq!(b.total - b.base, b.tax());
    }

    #[test]
    fn test_regime_is_case_sensitive() {
        assert_eq!(
            TaxRegime::for_states(Some("Maharashtra"), "Maharashtra"),
            TaxRegime::IntraState
        );
        assert_eq!(
            TaxRegime::for_states(Some("maharashtra"), "Maharashtra"),
            TaxRegime::InterState
        );
    }
}
