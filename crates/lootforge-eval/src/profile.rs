// crates/lootforge-eval/src/profile.rs
// ============================================================================
// Module: Evaluation Profile Weights
// Description: The numeric weights an evaluation profile contributes to
//   the final-score formula.
// Purpose: Keep eval decoupled from the manifest crate's authored types;
//   the CLI translates authored evaluation profiles into this shape.
// Dependencies: none
// ============================================================================

/// The weights one evaluation profile contributes to a target's final
/// score.
#[derive(Debug, Clone, Copy)]
pub struct ProfileWeights {
    /// Multiplier applied to the selected candidate's base score.
    pub candidate_score_weight: f64,
    /// Multiplier applied to the weighted adapter-metric bonus.
    pub adapter_bonus_weight: f64,
    /// Texture budget in bytes, when the profile declares one.
    pub texture_budget_bytes: Option<u64>,
}

impl Default for ProfileWeights {
    fn default() -> Self {
        Self { candidate_score_weight: 1.0, adapter_bonus_weight: 1.0, texture_budget_bytes: None }
    }
}
