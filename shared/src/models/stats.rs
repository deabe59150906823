//! Spend statistics DTOs

use serde::{Deserialize, Serialize};

/// Active spend of one team
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamSpend {
    pub team: String,
    pub amount: f64,
}

/// Aggregate spend/waste report returned by `GET /stats`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SpendStats {
    pub total_spend: f64,
    pub wasted_spend: f64,
    pub active_subs: u32,
    pub active_fully_used: u32,
    pub active_with_waste: u32,
    pub zombie_count: u32,
    /// 0..=100, 100 when nothing is wasted
    pub health_score: u8,
    /// Sorted by amount, highest first
    pub spend_by_team: Vec<TeamSpend>,
}

/// Result of `POST /integrations/analyze`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisSummary {
    pub analyzed_count: u32,
    pub zombies_found: u32,
    pub potential_savings: f64,
}
