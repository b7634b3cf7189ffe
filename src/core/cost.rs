use super::error::EngineError;
use super::reference::{DAYS_PER_MONTH, MONTHS_PER_YEAR, ReferenceTables};
use super::types::{CostBasis, CostSchedule, CostYear};

#[derive(Debug, Clone, Copy)]
pub struct SchedulePlan {
    pub daily_wage: f64,
    pub start_year: i32,
    pub years_to_pay: u32,
    pub cost_basis: CostBasis,
    // Prorates the final year when set.
    pub months_remaining: Option<u32>,
}

impl SchedulePlan {
    pub fn new(daily_wage: f64, start_year: i32, years_to_pay: u32) -> Self {
        Self {
            daily_wage,
            start_year,
            years_to_pay,
            cost_basis: CostBasis::Nominal,
            months_remaining: None,
        }
    }
}

fn rate_for_year(tables: &ReferenceTables, year: i32) -> Result<f64, EngineError> {
    tables.program_rate(year).ok_or_else(|| {
        let (first, last) = tables.program_years();
        EngineError::InvalidYear { year, first, last }
    })
}

pub fn monthly_cost(
    tables: &ReferenceTables,
    daily_wage: f64,
    year: i32,
) -> Result<f64, EngineError> {
    let rate_pct = rate_for_year(tables, year)?;
    Ok(daily_wage * DAYS_PER_MONTH * (rate_pct / 100.0))
}

pub fn program_daily_wage(
    tables: &ReferenceTables,
    daily_wage: f64,
    year: i32,
    basis: CostBasis,
) -> f64 {
    match basis {
        CostBasis::Nominal => daily_wage,
        CostBasis::IndexLinked => {
            let multiple = daily_wage / tables.index_daily_baseline;
            multiple * tables.index_for_year(year)
        }
    }
}

pub fn simulate_schedule(
    tables: &ReferenceTables,
    daily_wage: f64,
    start_year: i32,
    years_to_pay: u32,
) -> Result<CostSchedule, EngineError> {
    simulate_plan(tables, &SchedulePlan::new(daily_wage, start_year, years_to_pay))
}

pub fn simulate_plan(
    tables: &ReferenceTables,
    plan: &SchedulePlan,
) -> Result<CostSchedule, EngineError> {
    if plan.years_to_pay == 0 {
        return Err(EngineError::InvalidDuration);
    }
    rate_for_year(tables, plan.start_year)?;

    let (_, last_year) = tables.program_years();
    let years_left_in_table = u32::try_from(last_year - plan.start_year + 1).unwrap_or(0);
    let span = plan.years_to_pay.min(years_left_in_table);

    let mut months_left = plan.months_remaining.map(|m| m.max(1));
    let mut years = Vec::with_capacity(span as usize);
    let mut total_cost = 0.0;
    let mut months_counted = 0;

    for year in (plan.start_year..).take(span as usize) {
        let months_paid = match months_left {
            Some(0) => break,
            Some(left) => left.min(MONTHS_PER_YEAR),
            None => MONTHS_PER_YEAR,
        };
        if let Some(left) = months_left.as_mut() {
            *left -= months_paid;
        }

        let rate_pct = rate_for_year(tables, year)?;
        let daily_wage = program_daily_wage(tables, plan.daily_wage, year, plan.cost_basis);
        let monthly = monthly_cost(tables, daily_wage, year)?;
        let annual_cost = monthly * months_paid as f64;

        total_cost += annual_cost;
        months_counted += months_paid;
        years.push(CostYear {
            year,
            rate_pct,
            daily_wage,
            monthly_cost: monthly,
            annual_cost,
            months_paid,
        });
    }

    let average_monthly_cost = if months_counted > 0 {
        total_cost / months_counted as f64
    } else {
        0.0
    };

    Ok(CostSchedule {
        years_counted: years.len() as u32,
        months_counted,
        total_cost,
        average_monthly_cost,
        years,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn monthly_cost_applies_year_rate() {
        let tables = ReferenceTables::regime_2025();
        let cost = monthly_cost(&tables, 1000.0, 2025).expect("2025 is tabulated");
        assert_approx(cost, 1000.0 * 30.4 * 0.13347);
    }

    #[test]
    fn monthly_cost_rejects_years_outside_table() {
        let tables = ReferenceTables::regime_2025();
        let err = monthly_cost(&tables, 1000.0, 2031).expect_err("2031 has no rate");
        assert_eq!(
            err,
            EngineError::InvalidYear {
                year: 2031,
                first: 2021,
                last: 2030
            }
        );
        assert!(monthly_cost(&tables, 1000.0, 2020).is_err());
    }

    #[test]
    fn six_year_schedule_sums_each_year() {
        let tables = ReferenceTables::regime_2025();
        let wage = 2828.50;
        let schedule = simulate_schedule(&tables, wage, 2025, 6).expect("valid schedule");
        let expected: f64 = (2025..=2030)
            .map(|y| monthly_cost(&tables, wage, y).expect("tabulated") * 12.0)
            .sum();
        assert_eq!(schedule.years_counted, 6);
        assert_approx(schedule.total_cost, expected);
        assert_approx(schedule.average_monthly_cost, expected / 72.0);
        let years: Vec<i32> = schedule.years.iter().map(|y| y.year).collect();
        assert_eq!(years, vec![2025, 2026, 2027, 2028, 2029, 2030]);
    }

    #[test]
    fn schedule_truncates_at_last_program_year() {
        let tables = ReferenceTables::regime_2025();
        let schedule = simulate_schedule(&tables, 1000.0, 2029, 6).expect("valid schedule");
        assert_eq!(schedule.years_counted, 2);
        assert_eq!(schedule.years[0].year, 2029);
        assert_eq!(schedule.years[1].year, 2030);
    }

    #[test]
    fn huge_duration_is_clamped_to_program_table() {
        let tables = ReferenceTables::regime_2025();
        let schedule = simulate_schedule(&tables, 1000.0, 2025, u32::MAX).expect("valid schedule");
        assert_eq!(schedule.years_counted, 6);
        assert_eq!(schedule.years.last().map(|y| y.year), Some(2030));

        let schedule =
            simulate_schedule(&tables, 1000.0, 2030, i32::MAX as u32).expect("valid schedule");
        assert_eq!(schedule.years_counted, 1);
    }

    #[test]
    fn zero_years_is_rejected() {
        let tables = ReferenceTables::regime_2025();
        let err = simulate_schedule(&tables, 1000.0, 2025, 0).expect_err("needs a year");
        assert_eq!(err, EngineError::InvalidDuration);
    }

    #[test]
    fn start_year_outside_table_is_rejected() {
        let tables = ReferenceTables::regime_2025();
        let err = simulate_schedule(&tables, 1000.0, 2035, 2).expect_err("no rate for 2035");
        assert!(matches!(err, EngineError::InvalidYear { year: 2035, .. }));
    }

    #[test]
    fn partial_final_year_prorates_annual_cost_only() {
        let tables = ReferenceTables::regime_2025();
        let plan = SchedulePlan {
            months_remaining: Some(17),
            ..SchedulePlan::new(1000.0, 2025, 2)
        };
        let schedule = simulate_plan(&tables, &plan).expect("valid schedule");
        assert_eq!(schedule.years[0].months_paid, 12);
        assert_eq!(schedule.years[1].months_paid, 5);
        let monthly_2026 = monthly_cost(&tables, 1000.0, 2026).expect("tabulated");
        assert_approx(schedule.years[1].monthly_cost, monthly_2026);
        assert_approx(schedule.years[1].annual_cost, monthly_2026 * 5.0);
        assert_eq!(schedule.months_counted, 17);
        assert_approx(schedule.average_monthly_cost, schedule.total_cost / 17.0);
    }

    #[test]
    fn months_running_out_stops_schedule_early() {
        let tables = ReferenceTables::regime_2025();
        let plan = SchedulePlan {
            months_remaining: Some(8),
            ..SchedulePlan::new(1000.0, 2025, 3)
        };
        let schedule = simulate_plan(&tables, &plan).expect("valid schedule");
        assert_eq!(schedule.years_counted, 1);
        assert_eq!(schedule.years[0].months_paid, 8);
    }

    #[test]
    fn index_linked_basis_keeps_index_multiple() {
        let tables = ReferenceTables::regime_2025();
        let plan = SchedulePlan {
            cost_basis: CostBasis::IndexLinked,
            ..SchedulePlan::new(2828.50, 2025, 2)
        };
        let schedule = simulate_plan(&tables, &plan).expect("valid schedule");
        assert_approx(schedule.years[0].daily_wage, 2828.50);
        assert_approx(schedule.years[1].daily_wage, 25.0 * 117.47);
        assert!(schedule.years[1].monthly_cost > schedule.years[0].monthly_cost);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]
        #[test]
        fn prop_schedule_years_are_contiguous_and_total_matches(
            wage in 1.0f64..3000.0,
            start in 2021i32..=2030,
            years in 1u32..10
        ) {
            let tables = ReferenceTables::regime_2025();
            let schedule = simulate_schedule(&tables, wage, start, years).expect("valid schedule");
            prop_assert_eq!(schedule.years_counted as usize, schedule.years.len());
            prop_assert!(schedule.years_counted <= years);
            for (offset, entry) in schedule.years.iter().enumerate() {
                prop_assert_eq!(entry.year, start + offset as i32);
                prop_assert_eq!(entry.months_paid, 12);
            }
            let sum: f64 = schedule.years.iter().map(|y| y.annual_cost).sum();
            prop_assert!((sum - schedule.total_cost).abs() < 1e-6);
        }
    }
}
