use tracing::debug;

use super::cost::{SchedulePlan, simulate_plan};
use super::engine::compute_pension;
use super::error::EngineError;
use super::reference::{MONTHS_PER_YEAR, ReferenceTables, WEEKS_PER_YEAR};
use super::types::{
    BlendWindow, CostSchedule, PensionBreakdown, PensionInputs, RoiMetrics, ScenarioRequest,
    ScenarioResult,
};

const AVERAGING_WEEKS: u32 = 250;
const DEFAULT_ENROLLMENT_WEEKS: u32 = 260;

pub fn compute_scenario(
    tables: &ReferenceTables,
    request: &ScenarioRequest,
) -> Result<ScenarioResult, EngineError> {
    let cap = tables.cap_daily();
    if request.desired_daily_wage > cap {
        return Err(EngineError::ExceedsWageCap {
            wage: request.desired_daily_wage,
            cap,
        });
    }
    if request.retirement_age > tables.legal_max_retirement_age {
        return Err(EngineError::ExceedsLegalRetirementAge {
            age: request.retirement_age,
            max: tables.legal_max_retirement_age,
        });
    }

    let baseline = compute_pension(
        tables,
        &PensionInputs {
            contributed_weeks: request.current_weeks,
            reference_daily_wage: request.current_daily_wage,
            retirement_age: request.retirement_age,
            family: request.family,
            index_daily_ref: None,
        },
    )?;

    let (years_to_enroll, program_weeks) = enrollment_window(tables, request);
    let enrolled_weeks = request
        .current_weeks
        .checked_add(program_weeks)
        .ok_or(EngineError::ContributionOverflow {
            weeks: request.current_weeks,
        })?;
    let blended_daily_wage = blend_reference_wage(
        request.current_weeks,
        request.current_daily_wage,
        request.desired_daily_wage,
        years_to_enroll,
        request.options.blend_window,
    );
    debug!(
        years_to_enroll,
        enrolled_weeks, blended_daily_wage, "resolved enrollment window"
    );

    let enrolled = compute_pension(
        tables,
        &PensionInputs {
            contributed_weeks: enrolled_weeks,
            reference_daily_wage: blended_daily_wage,
            retirement_age: request.retirement_age,
            family: request.family,
            index_daily_ref: None,
        },
    )?;

    let cost = simulate_plan(
        tables,
        &SchedulePlan {
            daily_wage: request.desired_daily_wage,
            start_year: request.start_year,
            years_to_pay: years_to_enroll,
            cost_basis: request.options.cost_basis,
            months_remaining: request.months_until_retirement,
        },
    )?;

    let roi = roi_metrics(tables, &baseline, &enrolled, &cost, request.desired_daily_wage);

    Ok(ScenarioResult {
        baseline,
        enrolled,
        years_to_enroll,
        enrolled_weeks,
        blended_daily_wage,
        cost,
        roi,
    })
}

// Months before retirement, when known, decide both the years paid and the weeks credited.
fn enrollment_window(tables: &ReferenceTables, request: &ScenarioRequest) -> (u32, u32) {
    match request.months_until_retirement {
        Some(months) => {
            let max_months = tables.max_enrollment_years * MONTHS_PER_YEAR;
            let months = months.clamp(1, max_months);
            let years = months.div_ceil(MONTHS_PER_YEAR);
            (years, months * WEEKS_PER_YEAR / MONTHS_PER_YEAR)
        }
        None => {
            let years = enrollment_years(tables, request.retirement_age, request.current_age);
            (years, years * WEEKS_PER_YEAR)
        }
    }
}

pub fn enrollment_years(
    tables: &ReferenceTables,
    retirement_age: u32,
    current_age: Option<u32>,
) -> u32 {
    let normal_age = tables.normal_retirement_age;
    let available = match current_age {
        Some(age) => retirement_age.saturating_sub(age),
        None if retirement_age < normal_age => (normal_age - retirement_age).max(1),
        None => 1,
    };
    available.min(tables.max_enrollment_years).max(1)
}

pub fn blend_reference_wage(
    current_weeks: u32,
    current_daily_wage: f64,
    desired_daily_wage: f64,
    years_to_enroll: u32,
    window: BlendWindow,
) -> f64 {
    if current_weeks >= AVERAGING_WEEKS {
        return desired_daily_wage;
    }

    let enrollment_weeks = i64::from(match window {
        BlendWindow::Fixed260 => DEFAULT_ENROLLMENT_WEEKS,
        BlendWindow::EnrolledWeeks => years_to_enroll * WEEKS_PER_YEAR,
    });
    let averaging = i64::from(AVERAGING_WEEKS);
    let old_weeks_in_window =
        (averaging - (enrollment_weeks - (averaging - i64::from(current_weeks)))).max(0);

    let weight_old = (old_weeks_in_window as f64 / averaging as f64).min(1.0);
    let weight_new = 1.0 - weight_old;
    current_daily_wage * weight_old + desired_daily_wage * weight_new
}

fn roi_metrics(
    tables: &ReferenceTables,
    baseline: &PensionBreakdown,
    enrolled: &PensionBreakdown,
    cost: &CostSchedule,
    desired_daily_wage: f64,
) -> RoiMetrics {
    let monthly_difference = enrolled.final_monthly - baseline.final_monthly;
    let annual_difference = monthly_difference * 12.0;

    let annual_return_pct = if cost.total_cost > 0.0 {
        annual_difference / cost.total_cost * 100.0
    } else {
        0.0
    };
    let payback_years = (annual_difference > 0.0).then(|| cost.total_cost / annual_difference);

    RoiMetrics {
        monthly_difference,
        annual_difference,
        annual_return_pct,
        payback_years,
        feasible: desired_daily_wage <= tables.cap_daily(),
        wage_multiple_level: desired_daily_wage / tables.index_daily_baseline,
    }
}
