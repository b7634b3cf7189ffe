use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("at least {min} contributed weeks are required for a pension, got {weeks}")]
    InsufficientContribution { weeks: u32, min: u32 },
    #[error("{weeks} contributed weeks plus the enrollment period exceed the week counter")]
    ContributionOverflow { weeks: u32 },
    #[error("daily wage {wage:.2} exceeds the contribution cap of {cap:.2}")]
    ExceedsWageCap { wage: f64, cap: f64 },
    #[error("retirement age {age} exceeds the legal maximum of {max}")]
    ExceedsLegalRetirementAge { age: u32, max: u32 },
    #[error("year {year} is outside the program rate table ({first}-{last})")]
    InvalidYear { year: i32, first: i32, last: i32 },
    #[error("enrollment duration must be at least one year")]
    InvalidDuration,
    #[error("payback period is undefined when the pension gain is not positive")]
    UndefinedPayback,
}

impl EngineError {
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InsufficientContribution { .. } => "insufficient-contribution",
            EngineError::ContributionOverflow { .. } => "contribution-overflow",
            EngineError::ExceedsWageCap { .. } => "exceeds-wage-cap",
            EngineError::ExceedsLegalRetirementAge { .. } => "exceeds-legal-retirement-age",
            EngineError::InvalidYear { .. } => "invalid-year",
            EngineError::InvalidDuration => "invalid-duration",
            EngineError::UndefinedPayback => "undefined-payback",
        }
    }
}
