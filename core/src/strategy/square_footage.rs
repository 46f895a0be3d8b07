//! Area-rate quoting: rate × area × multiplier stack.
//!
//! Per area:
//!   base        = total_sqft × base_rate_per_sqft
//!   before_freq = base × floor × condition
//!   monthly     = before_freq × frequency_multiplier × (1 + add_on)
//! Rows are rounded, then summed. The building multiplier adjusts the
//! subtotal; the minimum charge replaces a total below it.

use super::{finish_quote, PricingStrategy, QuoteInput, QuoteParts, StrategyMetadata};
use crate::{
    error::PricingResult,
    facility::Area,
    frequency::Frequency,
    numeric::{round2, round_row, sum_rounded_rows},
    quote::{AreaDetail, AreaQuoteRow, CostBreakdown, QuoteResult},
    settings::{PricingSettings, PricingType},
};

pub const SQUARE_FOOTAGE_KEY: &str = "square_footage_v1";

pub struct SquareFootageStrategy {
    metadata: StrategyMetadata,
}

impl SquareFootageStrategy {
    pub fn new() -> Self {
        Self {
            metadata: StrategyMetadata {
                key: SQUARE_FOOTAGE_KEY.to_string(),
                name: "Square Footage".to_string(),
                version: "1.0.0".to_string(),
                description: "Area rate times square footage with floor, condition, \
                              frequency and building multipliers"
                    .to_string(),
                pricing_type: PricingType::SquareFoot,
                is_default: true,
                is_active: true,
            },
        }
    }

    fn price_area(
        &self,
        area: &Area,
        settings: &PricingSettings,
        frequency: Frequency,
        add_on: f64,
    ) -> AreaQuoteRow {
        let total_sqft = area.total_square_feet();
        let base_price = total_sqft * settings.base_rate_per_sqft;
        let floor_multiplier = settings.floor_type_multipliers.factor(area.floor_type);
        let condition_multiplier = settings.condition_multipliers.factor(area.condition_level);
        let price_before_frequency = base_price * floor_multiplier * condition_multiplier;
        let frequency_multiplier = settings.frequency_multipliers.factor(frequency);
        let monthly = price_before_frequency * frequency_multiplier * (1.0 + add_on);

        log::debug!(
            "square_footage: area={} sqft={total_sqft:.0} base=${base_price:.2} \
             floor={floor_multiplier} condition={condition_multiplier} freq={frequency_multiplier}",
            area.area_id
        );

        AreaQuoteRow {
            area_id: Some(area.area_id.clone()),
            name: area.name.clone(),
            total_square_feet: total_sqft,
            monthly_amount: round_row(monthly),
            detail: AreaDetail::SquareFoot {
                base_price: round2(base_price),
                floor_multiplier,
                condition_multiplier,
                price_before_frequency: round2(price_before_frequency),
                frequency_multiplier,
                task_complexity_add_on: add_on,
            },
        }
    }
}

impl Default for SquareFootageStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingStrategy for SquareFootageStrategy {
    fn metadata(&self) -> &StrategyMetadata {
        &self.metadata
    }

    fn quote(&self, input: &QuoteInput<'_>) -> PricingResult<QuoteResult> {
        let settings = input.settings;
        let add_on = input.task_complexity_add_on();
        let frequency = input.request.service_frequency;

        let areas: Vec<AreaQuoteRow> = input
            .bundle
            .areas
            .iter()
            .map(|area| self.price_area(area, settings, frequency, add_on))
            .collect();

        let subtotal = sum_rounded_rows(areas.iter().map(|r| r.monthly_amount));
        let building_multiplier = settings
            .building_type_multipliers
            .factor(input.bundle.facility.building_type);
        let building_adjustment = round2(subtotal * (building_multiplier - 1.0));
        let pre_minimum_total = round2(subtotal + building_adjustment);

        Ok(finish_quote(
            &self.metadata,
            input,
            QuoteParts {
                areas,
                breakdown: CostBreakdown::SquareFoot {
                    building_multiplier,
                    building_adjustment,
                },
                subtotal,
                task_complexity_add_on: add_on,
                pre_minimum_total,
            },
        ))
    }
}
