//! Pricing table and per-entry cost calculation.
//!
//! Rates are USD per million tokens and are looked up by exact model name. Models
//! missing from the table are billed at [`DEFAULT_PRICING`].
//!
//! Input, output, cache-write and cache-read tokens are four independent line items.
//! Cache-read tokens are never subtracted from input tokens; the usage record already
//! reports them separately.

use crate::models::*;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::debug;

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// Placeholder model name on entries the client generated locally.
pub const SYNTHETIC_MODEL: &str = "<synthetic>";

pub const DEFAULT_PRICING: PricingTier = PricingTier {
    input: 3.0,
    output: 15.0,
    cache_write: 3.75,
    cache_read: 0.30,
};

const OPUS: PricingTier = PricingTier {
    input: 15.0,
    output: 75.0,
    cache_write: 18.75,
    cache_read: 1.50,
};

const SONNET: PricingTier = PricingTier {
    input: 3.0,
    output: 15.0,
    cache_write: 3.75,
    cache_read: 0.30,
};

static MODEL_PRICING: Lazy<HashMap<&'static str, PricingTier>> = Lazy::new(|| {
    HashMap::from([
        // Claude 4
        ("claude-opus-4-20250514", OPUS),
        ("claude-sonnet-4-20250514", SONNET),
        // Claude 3.5
        ("claude-3-5-sonnet-20241022", SONNET),
        ("claude-3-5-sonnet-20240620", SONNET),
        (
            "claude-3-5-haiku-20241022",
            PricingTier {
                input: 0.80,
                output: 4.0,
                cache_write: 1.0,
                cache_read: 0.08,
            },
        ),
        // Claude 3
        ("claude-3-opus-20240229", OPUS),
        ("claude-3-sonnet-20240229", SONNET),
        (
            "claude-3-haiku-20240307",
            PricingTier {
                input: 0.25,
                output: 1.25,
                cache_write: 0.3125,
                cache_read: 0.025,
            },
        ),
    ])
});

/// Result of costing one entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryCost {
    pub usd: f64,
    /// `None` for legacy pre-costed entries and entries with nothing to bill.
    pub model: Option<String>,
    pub tokens: TokenBreakdown,
}

impl EntryCost {
    /// Nothing to fold into the cost-side counters.
    pub fn is_empty(&self) -> bool {
        self.usd == 0.0 && self.model.is_none()
    }
}

pub struct PricingManager;

impl PricingManager {
    pub fn tier_for(model_name: &str) -> PricingTier {
        MODEL_PRICING
            .get(model_name)
            .copied()
            .unwrap_or(DEFAULT_PRICING)
    }

    pub fn is_known_model(model_name: &str) -> bool {
        MODEL_PRICING.contains_key(model_name)
    }

    pub fn calculate_cost_from_tokens(usage: &Usage, model_name: &str) -> f64 {
        let pricing = Self::tier_for(model_name);

        usage.input_tokens as f64 * pricing.input / TOKENS_PER_MILLION
            + usage.output_tokens as f64 * pricing.output / TOKENS_PER_MILLION
            + usage.cache_write_tokens as f64 * pricing.cache_write / TOKENS_PER_MILLION
            + usage.cache_read_tokens as f64 * pricing.cache_read / TOKENS_PER_MILLION
    }

    /// Cost, model and token breakdown for one entry.
    ///
    /// A positive `costUSD` wins and is trusted as-is, with no model or tokens recorded.
    pub fn entry_cost(entry: &LogEntry) -> EntryCost {
        if let Some(cost) = entry.legacy_cost_usd.filter(|cost| *cost > 0.0) {
            debug!(cost_usd = cost, "Using pre-calculated cost from entry");
            return EntryCost {
                usd: cost,
                ..EntryCost::default()
            };
        }

        let Some(usage) = entry.usage() else {
            return EntryCost::default();
        };

        let model = entry.model().unwrap_or_default();
        if model == SYNTHETIC_MODEL {
            return EntryCost::default();
        }

        let usd = Self::calculate_cost_from_tokens(usage, model);
        debug!(
            model = %model,
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            cache_write_tokens = usage.cache_write_tokens,
            cache_read_tokens = usage.cache_read_tokens,
            known_model = Self::is_known_model(model),
            cost_usd = usd,
            "Using token-based cost calculation"
        );

        EntryCost {
            usd,
            model: (!model.is_empty()).then(|| model.to_string()),
            tokens: TokenBreakdown::from(usage),
        }
    }
}
