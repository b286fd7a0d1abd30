//! Generation call counters and cost estimation.
//!
//! [`UsageSummary`] is the running tally for one project session: call
//! counts for the two text tiers and the image tier, plus per-tier token
//! sums.  Counters move only forward and only on *completed* collaborator
//! calls -- a failed attempt is never billed.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Price table
// ---------------------------------------------------------------------------

/// USD per million input tokens, pro text tier.
pub const PRO_INPUT_USD_PER_MTOK: f64 = 1.25;
/// USD per million output tokens, pro text tier.
pub const PRO_OUTPUT_USD_PER_MTOK: f64 = 10.0;
/// USD per million input tokens, flash text tier.
pub const FLASH_INPUT_USD_PER_MTOK: f64 = 0.30;
/// USD per million output tokens, flash text tier.
pub const FLASH_OUTPUT_USD_PER_MTOK: f64 = 2.50;
/// Flat USD per generated image.
pub const IMAGE_USD_PER_CALL: f64 = 0.039;

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// The two text-generation tiers tracked separately for billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTier {
    /// Heavyweight tier used for breakdown generation.
    Pro,
    /// Lightweight tier used for keyframe prompts.
    Flash,
}

// ---------------------------------------------------------------------------
// Usage summary
// ---------------------------------------------------------------------------

/// Monotonic counters for generation calls and token usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    #[serde(default)]
    pub pro_calls: u64,
    #[serde(default)]
    pub pro_input_tokens: u64,
    #[serde(default)]
    pub pro_output_tokens: u64,
    #[serde(default)]
    pub flash_calls: u64,
    #[serde(default)]
    pub flash_input_tokens: u64,
    #[serde(default)]
    pub flash_output_tokens: u64,
    #[serde(default)]
    pub image_calls: u64,
}

impl UsageSummary {
    /// Record one completed text-tier call.
    pub fn record_text(&mut self, tier: TextTier, input_tokens: u64, output_tokens: u64) {
        match tier {
            TextTier::Pro => {
                self.pro_calls += 1;
                self.pro_input_tokens += input_tokens;
                self.pro_output_tokens += output_tokens;
            }
            TextTier::Flash => {
                self.flash_calls += 1;
                self.flash_input_tokens += input_tokens;
                self.flash_output_tokens += output_tokens;
            }
        }
    }

    /// Record one completed image call.
    pub fn record_image(&mut self) {
        self.image_calls += 1;
    }

    /// Total calls across all tiers.
    pub fn total_calls(&self) -> u64 {
        self.pro_calls + self.flash_calls + self.image_calls
    }

    /// Estimated spend in USD against the fixed price table.
    pub fn estimated_cost_usd(&self) -> f64 {
        let pro = self.pro_input_tokens as f64 / TOKENS_PER_MILLION * PRO_INPUT_USD_PER_MTOK
            + self.pro_output_tokens as f64 / TOKENS_PER_MILLION * PRO_OUTPUT_USD_PER_MTOK;
        let flash = self.flash_input_tokens as f64 / TOKENS_PER_MILLION
            * FLASH_INPUT_USD_PER_MTOK
            + self.flash_output_tokens as f64 / TOKENS_PER_MILLION * FLASH_OUTPUT_USD_PER_MTOK;
        let image = self.image_calls as f64 * IMAGE_USD_PER_CALL;
        pro + flash + image
    }
}
