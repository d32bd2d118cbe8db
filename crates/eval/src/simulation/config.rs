//! Pricing parameters injected into the simulation engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A flat fee added to every quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeSpec {
    pub name: String,
    pub amount: Decimal,
}

/// A tax charged as a rate of the total adjusted premium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxSpec {
    pub name: String,
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Base rate used for a selected coverage missing from the rate table.
    pub default_base_rate: Decimal,
    /// Decimal places money amounts are rounded to.
    pub money_scale: u32,
    pub fees: Vec<FeeSpec>,
    pub taxes: Vec<TaxSpec>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            default_base_rate: Decimal::new(100, 0),
            money_scale: 2,
            fees: vec![
                FeeSpec {
                    name: "Policy Fee".to_string(),
                    amount: Decimal::new(25, 0),
                },
                FeeSpec {
                    name: "Inspection Fee".to_string(),
                    amount: Decimal::new(15, 0),
                },
            ],
            taxes: vec![TaxSpec {
                name: "Premium Tax".to_string(),
                rate: Decimal::new(3, 2),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg: SimulationConfig =
            serde_json::from_value(serde_json::json!({ "money_scale": 4 })).unwrap();
        assert_eq!(cfg.money_scale, 4);
        assert_eq!(cfg.default_base_rate, Decimal::new(100, 0));
        assert_eq!(cfg.fees.len(), 2);
        assert_eq!(cfg.taxes[0].rate, Decimal::new(3, 2));
    }
}
