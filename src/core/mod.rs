mod cost;
mod engine;
mod error;
mod rates;
mod reference;
mod scenario;
mod types;

pub use cost::{SchedulePlan, monthly_cost, program_daily_wage, simulate_plan, simulate_schedule};
pub use engine::compute_pension;
pub use error::EngineError;
pub use rates::lookup_rates;
pub use reference::{DAYS_PER_MONTH, PercentBand, ReferenceTables};
pub use scenario::{blend_reference_wage, compute_scenario, enrollment_years};
pub use types::{
    BlendWindow, CostBasis, CostSchedule, CostYear, Family, LimitsSnapshot, PensionBreakdown,
    PensionInputs, ProgramRate, RateMatch, Rates, RoiMetrics, ScenarioOptions, ScenarioRequest,
    ScenarioResult,
};
