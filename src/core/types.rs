use serde::Serialize;

use super::error::EngineError;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum BlendWindow {
    #[default]
    Fixed260,
    EnrolledWeeks,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum CostBasis {
    #[default]
    Nominal,
    IndexLinked,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ScenarioOptions {
    pub blend_window: BlendWindow,
    pub cost_basis: CostBasis,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Family {
    pub has_spouse: bool,
    pub num_children: u32,
    pub has_dependent_parents: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RateMatch {
    Band(usize),
    Fallback,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Rates {
    pub wage_multiple: f64,
    pub basic_quantity: f64,
    pub increment: f64,
    pub matched: RateMatch,
}

#[derive(Debug, Clone)]
pub struct PensionInputs {
    pub contributed_weeks: u32,
    pub reference_daily_wage: f64,
    pub retirement_age: u32,
    pub family: Family,
    pub index_daily_ref: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PensionBreakdown {
    pub reference_daily_wage: f64,
    pub wage_multiple: f64,
    pub basic_quantity_pct: f64,
    pub increment_pct: f64,
    pub contributed_weeks: u32,
    pub extra_years: u32,
    pub retirement_age: u32,
    pub age_factor: f64,
    pub basic_quantity_monthly: f64,
    pub increment_monthly: f64,
    pub base_pension_monthly: f64,
    pub spouse_allowance_monthly: f64,
    pub children_allowance_monthly: f64,
    pub parents_allowance_monthly: f64,
    pub solitude_allowance_monthly: f64,
    pub total_allowances_monthly: f64,
    pub with_allowances_monthly: f64,
    pub age_adjusted_monthly: f64,
    pub old_age_bonus_monthly: f64,
    pub unfloored_monthly: f64,
    pub final_monthly: f64,
    pub floor_applied: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostYear {
    pub year: i32,
    pub rate_pct: f64,
    pub daily_wage: f64,
    pub monthly_cost: f64,
    pub annual_cost: f64,
    pub months_paid: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostSchedule {
    pub years: Vec<CostYear>,
    pub total_cost: f64,
    pub years_counted: u32,
    pub months_counted: u32,
    pub average_monthly_cost: f64,
}

#[derive(Debug, Clone)]
pub struct ScenarioRequest {
    pub current_weeks: u32,
    pub current_daily_wage: f64,
    pub desired_daily_wage: f64,
    pub retirement_age: u32,
    pub family: Family,
    pub start_year: i32,
    pub current_age: Option<u32>,
    pub months_until_retirement: Option<u32>,
    pub options: ScenarioOptions,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiMetrics {
    pub monthly_difference: f64,
    pub annual_difference: f64,
    pub annual_return_pct: f64,
    // None when the monthly gain is zero or negative.
    pub payback_years: Option<f64>,
    pub feasible: bool,
    pub wage_multiple_level: f64,
}

impl RoiMetrics {
    pub fn payback(&self) -> Result<f64, EngineError> {
        self.payback_years.ok_or(EngineError::UndefinedPayback)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioResult {
    pub baseline: PensionBreakdown,
    pub enrolled: PensionBreakdown,
    pub years_to_enroll: u32,
    pub enrolled_weeks: u32,
    pub blended_daily_wage: f64,
    pub cost: CostSchedule,
    pub roi: RoiMetrics,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramRate {
    pub year: i32,
    pub rate_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitsSnapshot {
    pub snapshot_year: i32,
    pub index_daily: f64,
    pub index_monthly: f64,
    pub cap_multiple: f64,
    pub cap_daily: f64,
    pub cap_monthly: f64,
    pub min_guaranteed_daily: f64,
    pub min_guaranteed_monthly: f64,
    pub legal_max_retirement_age: u32,
    pub min_contribution_weeks: u32,
    pub program_rates: Vec<ProgramRate>,
}
