use super::error::EngineError;
use super::rates::lookup_rates;
use super::reference::{DAYS_PER_YEAR, ReferenceTables, WEEKS_PER_YEAR};
use super::types::{Family, PensionBreakdown, PensionInputs};

#[derive(Debug, Clone, Copy, Default)]
struct Allowances {
    spouse: f64,
    children: f64,
    parents: f64,
    solitude: f64,
}

impl Allowances {
    fn total(self) -> f64 {
        self.spouse + self.children + self.parents + self.solitude
    }
}

// Works on annual amounts; the floor is compared on annual amounts too.
pub fn compute_pension(
    tables: &ReferenceTables,
    inputs: &PensionInputs,
) -> Result<PensionBreakdown, EngineError> {
    if inputs.contributed_weeks < tables.min_contribution_weeks {
        return Err(EngineError::InsufficientContribution {
            weeks: inputs.contributed_weeks,
            min: tables.min_contribution_weeks,
        });
    }

    let wage = inputs.reference_daily_wage;
    let index = inputs.index_daily_ref.unwrap_or(tables.index_daily_baseline);
    let rates = lookup_rates(tables, wage, index);

    let basic_quantity_annual = wage * rates.basic_quantity * DAYS_PER_YEAR;

    // Partial 52-week blocks earn nothing.
    let extra_years = (inputs.contributed_weeks - tables.min_contribution_weeks) / WEEKS_PER_YEAR;
    let increment_annual = wage * rates.increment * DAYS_PER_YEAR * extra_years as f64;

    let base_annual = basic_quantity_annual + increment_annual;
    let allowances = family_allowances(tables, base_annual, inputs.family);
    let with_allowances = base_annual + allowances.total();

    let age_factor = tables.age_factor(inputs.retirement_age);
    let age_adjusted = with_allowances * age_factor;

    let old_age_bonus = if inputs.retirement_age >= tables.normal_retirement_age {
        age_adjusted * tables.old_age_bonus
    } else {
        0.0
    };

    let unfloored_annual = age_adjusted + old_age_bonus;
    let floor_annual = tables.min_guaranteed_monthly() * 12.0;
    let floor_applied = unfloored_annual < floor_annual;
    let final_annual = if floor_applied {
        floor_annual
    } else {
        unfloored_annual
    };

    Ok(PensionBreakdown {
        reference_daily_wage: wage,
        wage_multiple: rates.wage_multiple,
        basic_quantity_pct: rates.basic_quantity * 100.0,
        increment_pct: rates.increment * 100.0,
        contributed_weeks: inputs.contributed_weeks,
        extra_years,
        retirement_age: inputs.retirement_age,
        age_factor,
        basic_quantity_monthly: basic_quantity_annual / 12.0,
        increment_monthly: increment_annual / 12.0,
        base_pension_monthly: base_annual / 12.0,
        spouse_allowance_monthly: allowances.spouse / 12.0,
        children_allowance_monthly: allowances.children / 12.0,
        parents_allowance_monthly: allowances.parents / 12.0,
        solitude_allowance_monthly: allowances.solitude / 12.0,
        total_allowances_monthly: allowances.total() / 12.0,
        with_allowances_monthly: with_allowances / 12.0,
        age_adjusted_monthly: age_adjusted / 12.0,
        old_age_bonus_monthly: old_age_bonus / 12.0,
        unfloored_monthly: unfloored_annual / 12.0,
        final_monthly: final_annual / 12.0,
        floor_applied,
    })
}

fn family_allowances(tables: &ReferenceTables, base_annual: f64, family: Family) -> Allowances {
    let mut allowances = Allowances::default();

    if family.has_spouse {
        allowances.spouse = base_annual * tables.spouse_allowance;
    } else {
        allowances.solitude = base_annual * tables.solitude_allowance;
    }

    if family.num_children > 0 {
        allowances.children = base_annual * tables.child_allowance * family.num_children as f64;
    }

    // Parents only when neither a spouse nor children are already compensated.
    if family.has_dependent_parents && !family.has_spouse && family.num_children == 0 {
        allowances.parents = base_annual * tables.parent_allowance;
    }

    allowances
}
