//! Risk management for the trading core.
//!
//! Provides the dynamic leverage pipeline, trade eligibility and the
//! emergency stop ([`RiskManager`]), an account-wide lock around it
//! ([`SharedRiskManager`]), risk-based position sizing ([`PositionSizer`]) and
//! stop-loss validation.

mod history;
mod leverage;
mod position_sizer;
mod risk_manager;
mod shared;
mod stop_loss;

pub use history::TradeRecord;
pub use leverage::{
    calculate_leverage, LeverageAdjustment, LeverageConfig, LeverageDecision, LeverageHalt,
    LeverageInputs, LeverageStep,
};
pub use position_sizer::{PositionSizeResult, PositionSizer, SizingConfig, SizingRejection};
pub use risk_manager::{
    CooldownConfig, EmergencyConfig, EmergencyReason, IneligibleReason, RiskConfig, RiskLimits,
    RiskManager, RiskMetrics, TradeEligibility,
};
pub use shared::{RiskAssessment, SharedRiskManager};
pub use stop_loss::{validate_stop_loss, StopIssue, StopValidation, StopValidationConfig};
