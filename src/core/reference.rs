use std::collections::BTreeMap;

use super::types::{LimitsSnapshot, ProgramRate};

pub const DAYS_PER_MONTH: f64 = 30.4;
pub const DAYS_PER_YEAR: f64 = 365.0;
pub const WEEKS_PER_YEAR: u32 = 52;
pub const MONTHS_PER_YEAR: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentBand {
    pub range_min: f64,
    pub range_max: f64,
    pub basic_quantity_pct: f64,
    pub annual_increment_pct: f64,
}

const fn band(range_min: f64, range_max: f64, basic: f64, increment: f64) -> PercentBand {
    PercentBand {
        range_min,
        range_max,
        basic_quantity_pct: basic,
        annual_increment_pct: increment,
    }
}

#[derive(Debug, Clone)]
pub struct ReferenceTables {
    pub snapshot_year: i32,
    pub index_daily: BTreeMap<i32, f64>,
    pub projected_inflation: BTreeMap<i32, f64>,
    pub index_daily_baseline: f64,
    pub index_monthly_baseline: f64,
    pub cap_multiple: f64,
    pub program_rate_by_year: BTreeMap<i32, f64>,
    pub percent_table: Vec<PercentBand>,
    pub spouse_allowance: f64,
    pub child_allowance: f64,
    pub parent_allowance: f64,
    pub solitude_allowance: f64,
    pub old_age_bonus: f64,
    pub age_factor_by_age: BTreeMap<u32, f64>,
    pub normal_retirement_age: u32,
    pub legal_max_retirement_age: u32,
    pub min_contribution_weeks: u32,
    pub max_enrollment_years: u32,
    pub min_guaranteed_daily: f64,
}

impl Default for ReferenceTables {
    fn default() -> Self {
        Self::regime_2025()
    }
}

impl ReferenceTables {
    pub fn regime_2025() -> Self {
        let index_daily = BTreeMap::from([
            (2016, 73.04),
            (2017, 80.60),
            (2018, 84.39),
            (2019, 86.88),
            (2020, 89.62),
            (2021, 92.97),
            (2022, 96.22),
            (2023, 103.74),
            (2024, 108.57),
            (2025, 113.14),
            (2026, 117.47),
            (2027, 121.82),
            (2028, 126.20),
            (2029, 130.62),
            (2030, 135.08),
        ]);
        let projected_inflation = BTreeMap::from([
            (2026, 3.80),
            (2027, 3.70),
            (2028, 3.60),
            (2029, 3.50),
            (2030, 3.40),
        ]);
        let program_rate_by_year = BTreeMap::from([
            (2021, 10.075),
            (2022, 10.075),
            (2023, 11.166),
            (2024, 12.256),
            (2025, 13.347),
            (2026, 14.438),
            (2027, 15.528),
            (2028, 16.619),
            (2029, 17.709),
            (2030, 18.000),
        ]);
        let percent_table = vec![
            band(0.00, 1.00, 80.00, 0.56),
            band(1.00, 1.25, 77.11, 0.81),
            band(1.25, 1.50, 55.18, 1.18),
            band(1.50, 1.75, 49.23, 1.43),
            band(1.75, 2.00, 42.67, 1.62),
            band(2.00, 2.25, 37.65, 1.76),
            band(2.25, 2.50, 33.68, 1.87),
            band(2.50, 2.75, 30.48, 1.96),
            band(2.75, 3.00, 27.83, 2.03),
            band(3.00, 3.25, 25.60, 2.10),
            band(3.25, 3.50, 23.70, 2.15),
            band(3.50, 3.75, 22.07, 2.20),
            band(3.75, 4.00, 20.65, 2.24),
            band(4.00, 4.25, 19.39, 2.27),
            band(4.25, 4.50, 18.29, 2.30),
            band(4.50, 4.75, 17.30, 2.33),
            band(4.75, 5.00, 16.41, 2.36),
            band(5.00, 5.25, 15.61, 2.38),
            band(5.25, 5.50, 14.88, 2.40),
            band(5.50, 5.75, 14.22, 2.42),
            band(5.75, 6.00, 13.62, 2.43),
            band(6.00, f64::INFINITY, 13.00, 2.45),
        ];
        let age_factor_by_age = BTreeMap::from([
            (60, 0.75),
            (61, 0.80),
            (62, 0.85),
            (63, 0.90),
            (64, 0.95),
            (65, 1.00),
        ]);

        Self {
            snapshot_year: 2025,
            index_daily,
            projected_inflation,
            index_daily_baseline: 113.14,
            index_monthly_baseline: 3439.46,
            cap_multiple: 25.0,
            program_rate_by_year,
            percent_table,
            spouse_allowance: 0.15,
            child_allowance: 0.10,
            parent_allowance: 0.20,
            solitude_allowance: 0.15,
            old_age_bonus: 0.11,
            age_factor_by_age,
            normal_retirement_age: 65,
            legal_max_retirement_age: 65,
            min_contribution_weeks: 500,
            max_enrollment_years: 6,
            min_guaranteed_daily: 248.93,
        }
    }

    pub fn cap_daily(&self) -> f64 {
        self.index_daily_baseline * self.cap_multiple
    }

    pub fn min_guaranteed_monthly(&self) -> f64 {
        self.min_guaranteed_daily * DAYS_PER_MONTH
    }

    // Before the table: baseline. After it: compounded at index_extrapolation_growth.
    pub fn index_for_year(&self, year: i32) -> f64 {
        let (Some((&first, _)), Some((&last, &last_value))) = (
            self.index_daily.first_key_value(),
            self.index_daily.last_key_value(),
        ) else {
            return self.index_daily_baseline;
        };

        if year < first {
            return self.index_daily_baseline;
        }
        if year > last {
            let years_ahead = year - last;
            return last_value * (1.0 + self.index_extrapolation_growth()).powi(years_ahead);
        }
        self.index_daily
            .range(..=year)
            .next_back()
            .map(|(_, &value)| value)
            .unwrap_or(self.index_daily_baseline)
    }

    // Last projected inflation rate, else the growth between the last two tabulated years.
    pub fn index_extrapolation_growth(&self) -> f64 {
        if let Some((_, &pct)) = self.projected_inflation.last_key_value() {
            return pct / 100.0;
        }
        let mut tail = self.index_daily.values().rev();
        match (tail.next(), tail.next()) {
            (Some(&last), Some(&prev)) if prev > 0.0 => last / prev - 1.0,
            _ => 0.0,
        }
    }

    pub fn program_rate(&self, year: i32) -> Option<f64> {
        self.program_rate_by_year.get(&year).copied()
    }

    pub fn program_years(&self) -> (i32, i32) {
        let first = self
            .program_rate_by_year
            .keys()
            .next()
            .copied()
            .unwrap_or(self.snapshot_year);
        let last = self
            .program_rate_by_year
            .keys()
            .next_back()
            .copied()
            .unwrap_or(self.snapshot_year);
        (first, last)
    }

    pub fn age_factor(&self, retirement_age: u32) -> f64 {
        if retirement_age >= self.normal_retirement_age {
            return 1.0;
        }
        if let Some(&factor) = self.age_factor_by_age.get(&retirement_age) {
            return factor;
        }
        self.age_factor_by_age
            .values()
            .copied()
            .reduce(f64::min)
            .unwrap_or(1.0)
    }

    pub fn validate(&self) -> Result<(), String> {
        let Some(first_band) = self.percent_table.first() else {
            return Err("percent table must not be empty".to_string());
        };
        if first_band.range_min > 0.0 {
            return Err("percent table must start at a wage multiple of 0".to_string());
        }
        for pair in self.percent_table.windows(2) {
            let (lower, upper) = (pair[0], pair[1]);
            if (upper.range_min - lower.range_max).abs() > 1e-9 {
                return Err(format!(
                    "percent table has a gap or overlap between {} and {}",
                    lower.range_max, upper.range_min
                ));
            }
            if upper.basic_quantity_pct > lower.basic_quantity_pct {
                return Err(format!(
                    "basic quantity percent must not increase (band starting at {})",
                    upper.range_min
                ));
            }
        }
        if self
            .percent_table
            .last()
            .is_some_and(|last| last.range_max.is_finite())
        {
            return Err("last percent band must be open-ended".to_string());
        }

        let years: Vec<i32> = self.program_rate_by_year.keys().copied().collect();
        if years.is_empty() {
            return Err("program rate table must not be empty".to_string());
        }
        if years.windows(2).any(|w| w[1] != w[0] + 1) {
            return Err("program rate years must be contiguous".to_string());
        }

        if self
            .age_factor_by_age
            .values()
            .any(|&factor| !(factor > 0.0 && factor <= 1.0))
        {
            return Err("age factors must be in (0, 1]".to_string());
        }
        if self.index_daily_baseline <= 0.0 {
            return Err("baseline index must be > 0".to_string());
        }
        Ok(())
    }

    pub fn limits(&self) -> LimitsSnapshot {
        let cap_daily = self.cap_daily();
        LimitsSnapshot {
            snapshot_year: self.snapshot_year,
            index_daily: self.index_daily_baseline,
            index_monthly: self.index_monthly_baseline,
            cap_multiple: self.cap_multiple,
            cap_daily,
            cap_monthly: cap_daily * DAYS_PER_MONTH,
            min_guaranteed_daily: self.min_guaranteed_daily,
            min_guaranteed_monthly: self.min_guaranteed_monthly(),
            legal_max_retirement_age: self.legal_max_retirement_age,
            min_contribution_weeks: self.min_contribution_weeks,
            program_rates: self
                .program_rate_by_year
                .iter()
                .map(|(&year, &rate_pct)| ProgramRate { year, rate_pct })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn regime_2025_passes_validation() {
        ReferenceTables::regime_2025()
            .validate()
            .expect("shipped tables must be consistent");
    }

    #[test]
    fn cap_and_floor_derive_from_daily_values() {
        let tables = ReferenceTables::regime_2025();
        assert_approx(tables.cap_daily(), 2828.5);
        assert_approx(tables.min_guaranteed_monthly(), 248.93 * 30.4);
    }

    #[test]
    fn index_for_tabulated_year_is_stored_value() {
        let tables = ReferenceTables::regime_2025();
        assert_approx(tables.index_for_year(2018), 84.39);
        assert_approx(tables.index_for_year(2030), 135.08);
    }

    #[test]
    fn index_before_table_uses_baseline() {
        let tables = ReferenceTables::regime_2025();
        assert_approx(tables.index_for_year(2010), 113.14);
    }

    #[test]
    fn index_after_table_compounds_projected_inflation() {
        let tables = ReferenceTables::regime_2025();
        assert_approx(tables.index_extrapolation_growth(), 0.034);
        assert_approx(tables.index_for_year(2031), 135.08 * 1.034);
        assert_approx(tables.index_for_year(2033), 135.08 * 1.034f64.powi(3));
    }

    #[test]
    fn index_growth_falls_back_to_table_tail_without_projection() {
        let mut tables = ReferenceTables::regime_2025();
        tables.projected_inflation.clear();
        let growth = 135.08 / 130.62 - 1.0;
        assert_approx(tables.index_extrapolation_growth(), growth);
        assert_approx(tables.index_for_year(2031), 135.08 * (1.0 + growth));
    }

    #[test]
    fn age_factor_defaults_to_lowest_below_table() {
        let tables = ReferenceTables::regime_2025();
        assert_approx(tables.age_factor(58), 0.75);
        assert_approx(tables.age_factor(62), 0.85);
        assert_approx(tables.age_factor(65), 1.0);
        assert_approx(tables.age_factor(70), 1.0);
    }

    #[test]
    fn validate_rejects_gapped_percent_table() {
        let mut tables = ReferenceTables::regime_2025();
        tables.percent_table[1].range_min = 1.01;
        let err = tables.validate().expect_err("gap must be rejected");
        assert!(err.contains("gap"));
    }

    #[test]
    fn validate_rejects_closed_top_band() {
        let mut tables = ReferenceTables::regime_2025();
        if let Some(last) = tables.percent_table.last_mut() {
            last.range_max = 50.0;
        }
        let err = tables.validate().expect_err("bounded top band must be rejected");
        assert!(err.contains("open-ended"));
    }

    #[test]
    fn limits_snapshot_lists_program_years() {
        let limits = ReferenceTables::regime_2025().limits();
        assert_eq!(limits.program_rates.len(), 10);
        assert_eq!(limits.program_rates[0].year, 2021);
        assert_approx(limits.cap_monthly, 2828.5 * 30.4);
    }
}
