//! Indonesian payroll tax helpers: PPh 21 monthly TER withholding, annual
//! progressive brackets, and the rupiah/rate formatting used on settings screens.
//!
//! Amounts are whole rupiah. Rates are basis points (`500` = 5%).

use serde::{Deserialize, Serialize};

/// One income band: `min_income ..= max_income` (open-ended when `max_income` is `None`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub min_income: i64,
    pub max_income: Option<i64>,
    pub rate_bps: i32,
}

impl Band {
    pub fn contains(&self, income: i64) -> bool {
        income >= self.min_income && self.max_income.is_none_or(|max| income <= max)
    }

    pub fn label(&self) -> String {
        band_label(self.min_income, self.max_income, self.rate_bps)
    }
}

/// Annual taxable income is rounded down to the thousand rupiah.
pub const TAXABLE_ROUNDING: i64 = 1_000;

fn apply_rate(amount: i64, rate_bps: i32) -> i64 {
    ((amount as i128 * rate_bps as i128) / 10_000) as i64
}

/// Format as rupiah with dot thousands separators: `Rp 60.000.000`.
pub fn format_rupiah(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-Rp {grouped}")
    } else {
        format!("Rp {grouped}")
    }
}

/// Format basis points as a percentage without trailing zeros: `500` -> `5%`, `25` -> `0.25%`.
pub fn format_rate(rate_bps: i32) -> String {
    let whole = rate_bps / 100;
    let frac = (rate_bps % 100).abs();
    if frac == 0 {
        format!("{whole}%")
    } else if frac % 10 == 0 {
        format!("{whole}.{}%", frac / 10)
    } else {
        format!("{whole}.{frac:02}%")
    }
}

pub fn band_label(min_income: i64, max_income: Option<i64>, rate_bps: i32) -> String {
    match max_income {
        Some(max) => format!(
            "{} - {}: {}",
            format_rupiah(min_income),
            format_rupiah(max),
            format_rate(rate_bps)
        ),
        None => format!("> {}: {}", format_rupiah(min_income), format_rate(rate_bps)),
    }
}

/// Find the TER rate for a monthly gross income.
pub fn ter_rate(monthly_gross: i64, bands: &[Band]) -> Option<i32> {
    bands
        .iter()
        .find(|b| b.contains(monthly_gross))
        .map(|b| b.rate_bps)
}

/// Monthly PPh 21 withholding under the TER method.
pub fn ter_withholding(monthly_gross: i64, rate_bps: i32) -> i64 {
    apply_rate(monthly_gross.max(0), rate_bps)
}

/// `12 * monthly_gross - ptkp`, floored at zero and rounded down to the thousand.
pub fn annual_taxable_income(monthly_gross: i64, ptkp_annual: i64) -> i64 {
    let taxable = (monthly_gross.saturating_mul(12) - ptkp_annual).max(0);
    taxable - taxable % TAXABLE_ROUNDING
}

/// Progressive tax: each bracket taxes only the slice of income inside it.
pub fn progressive_tax(taxable: i64, brackets: &[Band]) -> i64 {
    let mut sorted: Vec<&Band> = brackets.iter().collect();
    sorted.sort_by_key(|b| b.min_income);

    sorted
        .into_iter()
        .filter(|b| taxable > b.min_income)
        .map(|b| {
            let upper = b.max_income.map_or(taxable, |max| taxable.min(max));
            apply_rate(upper - b.min_income, b.rate_bps)
        })
        .sum()
}

fn first_clash(bands: &[Band], inclusive: bool) -> Option<(Band, Band)> {
    let mut sorted = bands.to_vec();
    sorted.sort_by_key(|b| b.min_income);
    sorted.windows(2).find_map(|pair| {
        let (a, b) = (pair[0], pair[1]);
        match a.max_income {
            None => Some((a, b)),
            Some(max) if max > b.min_income || (inclusive && max == b.min_income) => {
                Some((a, b))
            }
            _ => None,
        }
    })
}

/// Progressive brackets tax the slice between bounds, so neighbours may share an edge.
/// Returns the first offending pair once sorted by lower bound.
pub fn find_overlap(bands: &[Band]) -> Option<(Band, Band)> {
    first_clash(bands, false)
}

/// TER lookup uses [`Band::contains`], which includes both ends, so a shared edge
/// would match two bands.
pub fn find_inclusive_overlap(bands: &[Band]) -> Option<(Band, Band)> {
    first_clash(bands, true)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaxSimulation {
    pub monthly_gross: i64,
    pub ptkp_code: String,
    pub ter_category: String,
    pub ter_rate_bps: i32,
    pub ter_rate_label: String,
    pub monthly_withholding: i64,
    pub annual_taxable_income: i64,
    pub annual_tax: i64,
    pub monthly_gross_label: String,
    pub monthly_withholding_label: String,
    pub annual_tax_label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brackets_2024() -> Vec<Band> {
        vec![
            Band {
                min_income: 0,
                max_income: Some(60_000_000),
                rate_bps: 500,
            },
            Band {
                min_income: 60_000_000,
                max_income: Some(250_000_000),
                rate_bps: 1500,
            },
            Band {
                min_income: 250_000_000,
                max_income: Some(500_000_000),
                rate_bps: 2500,
            },
            Band {
                min_income: 500_000_000,
                max_income: Some(5_000_000_000),
                rate_bps: 3000,
            },
            Band {
                min_income: 5_000_000_000,
                max_income: None,
                rate_bps: 3500,
            },
        ]
    }

    #[test]
    fn rupiah_grouping() {
        assert_eq!(format_rupiah(0), "Rp 0");
        assert_eq!(format_rupiah(999), "Rp 999");
        assert_eq!(format_rupiah(1_000), "Rp 1.000");
        assert_eq!(format_rupiah(60_000_000), "Rp 60.000.000");
        assert_eq!(format_rupiah(-15_000), "-Rp 15.000");
    }

    #[test]
    fn rate_formatting() {
        assert_eq!(format_rate(500), "5%");
        assert_eq!(format_rate(25), "0.25%");
        assert_eq!(format_rate(175), "1.75%");
        assert_eq!(format_rate(1250), "12.5%");
        assert_eq!(format_rate(0), "0%");
    }

    #[test]
    fn band_labels() {
        assert_eq!(band_label(0, Some(60_000_000), 500), "Rp 0 - Rp 60.000.000: 5%");
        assert_eq!(band_label(5_000_000_000, None, 3500), "> Rp 5.000.000.000: 35%");
    }

    #[test]
    fn progressive_tax_spans_brackets() {
        let brackets = brackets_2024();
        assert_eq!(progressive_tax(0, &brackets), 0);
        assert_eq!(progressive_tax(50_000_000, &brackets), 2_500_000);
        // 60jt * 5% + 40jt * 15%
        assert_eq!(progressive_tax(100_000_000, &brackets), 3_000_000 + 6_000_000);
    }

    #[test]
    fn progressive_tax_ignores_input_order() {
        let mut reversed = brackets_2024();
        reversed.reverse();
        assert_eq!(
            progressive_tax(300_000_000, &reversed),
            progressive_tax(300_000_000, &brackets_2024())
        );
    }

    #[test]
    fn ter_lookup_is_inclusive() {
        let bands = vec![
            Band {
                min_income: 0,
                max_income: Some(5_400_000),
                rate_bps: 0,
            },
            Band {
                min_income: 5_400_001,
                max_income: Some(5_650_000),
                rate_bps: 25,
            },
            Band {
                min_income: 5_650_001,
                max_income: None,
                rate_bps: 50,
            },
        ];
        assert_eq!(ter_rate(5_400_000, &bands), Some(0));
        assert_eq!(ter_rate(5_400_001, &bands), Some(25));
        assert_eq!(ter_rate(90_000_000, &bands), Some(50));
        assert_eq!(ter_withholding(5_500_000, 25), 13_750);
    }

    #[test]
    fn annual_taxable_rounds_down() {
        assert_eq!(annual_taxable_income(10_000_500, 54_000_000), 66_006_000);
        assert_eq!(annual_taxable_income(1_000_000, 54_000_000), 0);
    }

    #[test]
    fn overlap_detection() {
        assert!(find_overlap(&brackets_2024()).is_none());
        let bad = vec![
            Band {
                min_income: 0,
                max_income: Some(100),
                rate_bps: 1,
            },
            Band {
                min_income: 50,
                max_income: Some(200),
                rate_bps: 2,
            },
        ];
        assert!(find_overlap(&bad).is_some());
    }

    #[test]
    fn inclusive_bands_cannot_share_an_edge() {
        let touching = vec![
            Band {
                min_income: 0,
                max_income: Some(5_400_000),
                rate_bps: 0,
            },
            Band {
                min_income: 5_400_000,
                max_income: None,
                rate_bps: 25,
            },
        ];
        assert!(find_overlap(&touching).is_none());
        assert!(find_inclusive_overlap(&touching).is_some());

        let mut disjoint = touching.clone();
        disjoint[1].min_income = 5_400_001;
        assert!(find_inclusive_overlap(&disjoint).is_none());
    }
}
