//! Per-submission retry state.

use alloy::rpc::types::TransactionRequest;

use crate::blockchain::types::FeeSnapshot;
use crate::submission::fees::FeeMechanism;

/// Scale `value` by `permille / 1000` with integer arithmetic.
pub fn bump(value: u128, permille: u64) -> u128 {
    value.saturating_mul(u128::from(permille)) / 1_000
}

/// Pad a gas estimate by 50%, rounding up.
pub fn pad_gas_estimate(estimate: u64) -> u64 {
    estimate.saturating_mul(3).div_ceil(2)
}

/// Nonce, gas and fee fields of one logical submission.
///
/// Created once with `attempt = 1`; the classifier derives a new value for
/// every retry instead of mutating this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionConfig {
    pub attempt: u32,
    pub mechanism: FeeMechanism,
    pub gas_bump_permille: u64,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: Option<u128>,
    pub max_fee_per_gas: Option<u128>,
    pub max_priority_fee_per_gas: Option<u128>,
}

impl TransactionConfig {
    pub fn initial(
        mechanism: FeeMechanism,
        gas_bump_permille: u64,
        nonce: u64,
        gas_limit: u64,
        fees: &FeeSnapshot,
    ) -> Self {
        let (gas_price, max_fee_per_gas, max_priority_fee_per_gas) = match mechanism {
            FeeMechanism::Legacy => (fees.gas_price, None, None),
            FeeMechanism::Modern => (None, fees.max_fee_per_gas, fees.max_priority_fee_per_gas),
        };
        Self {
            attempt: 1,
            mechanism,
            gas_bump_permille,
            nonce,
            gas_limit,
            gas_price,
            max_fee_per_gas,
            max_priority_fee_per_gas,
        }
    }

    /// Same fields, next attempt.
    pub fn next_attempt(&self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self.clone()
        }
    }

    pub fn with_next_nonce(mut self) -> Self {
        self.nonce += 1;
        self
    }

    pub fn with_bumped_gas_limit(mut self) -> Self {
        let bumped = bump(u128::from(self.gas_limit), self.gas_bump_permille);
        self.gas_limit = u64::try_from(bumped).unwrap_or(u64::MAX);
        self
    }

    /// Raise the fee fields of the active mechanism by the bump factor.
    pub fn with_bumped_fees(mut self) -> Self {
        let permille = self.gas_bump_permille;
        match self.mechanism {
            FeeMechanism::Legacy => {
                self.gas_price = self.gas_price.map(|price| bump(price, permille));
            }
            FeeMechanism::Modern => {
                self.max_fee_per_gas = self.max_fee_per_gas.map(|fee| bump(fee, permille));
                self.max_priority_fee_per_gas =
                    self.max_priority_fee_per_gas.map(|fee| bump(fee, permille));
            }
        }
        self
    }

    /// Overlay nonce, gas limit and fee fields onto `request`.
    ///
    /// Everything else (recipient, value, data, chain id, sender) is kept.
    pub fn apply(&self, mut request: TransactionRequest) -> TransactionRequest {
        request.nonce = Some(self.nonce);
        request.gas = Some(self.gas_limit);
        request.gas_price = self.gas_price;
        request.max_fee_per_gas = self.max_fee_per_gas;
        request.max_priority_fee_per_gas = self.max_priority_fee_per_gas;
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};
    use alloy::network::TransactionBuilder;

    fn legacy_config(gas_price: u128) -> TransactionConfig {
        TransactionConfig::initial(
            FeeMechanism::Legacy,
            1_200,
            4,
            100_000,
            &FeeSnapshot::legacy(gas_price),
        )
    }

    #[test]
    fn test_bump_is_integer_permille() {
        assert_eq!(bump(100, 1_200), 120);
        assert_eq!(bump(120, 1_200), 144);
        assert_eq!(bump(7, 1_100), 7);
        assert_eq!(bump(u128::MAX, 2_000), u128::MAX / 1_000);
    }

    #[test]
    fn test_pad_gas_estimate_rounds_up() {
        assert_eq!(pad_gas_estimate(100_000), 150_000);
        assert_eq!(pad_gas_estimate(100_001), 150_002);
        assert_eq!(pad_gas_estimate(1), 2);
        assert_eq!(pad_gas_estimate(0), 0);
    }

    #[test]
    fn test_initial_modern_drops_gas_price() {
        let fees = FeeSnapshot {
            gas_price: Some(50),
            max_fee_per_gas: Some(200),
            max_priority_fee_per_gas: Some(2),
        };
        let config = TransactionConfig::initial(FeeMechanism::Modern, 1_100, 0, 21_000, &fees);
        assert_eq!(config.attempt, 1);
        assert_eq!(config.gas_price, None);
        assert_eq!(config.max_fee_per_gas, Some(200));
        assert_eq!(config.max_priority_fee_per_gas, Some(2));
    }

    #[test]
    fn test_fee_bumps_compound() {
        let config = legacy_config(100).with_bumped_fees();
        assert_eq!(config.gas_price, Some(120));
        let config = config.with_bumped_fees();
        assert_eq!(config.gas_price, Some(144));
    }

    #[test]
    fn test_gas_limit_bump_saturates() {
        let mut config = legacy_config(1);
        config.gas_limit = u64::MAX;
        assert_eq!(config.with_bumped_gas_limit().gas_limit, u64::MAX);
    }

    #[test]
    fn test_apply_keeps_call_fields() {
        let to = Address::repeat_byte(0xaa);
        let request = TransactionRequest::default()
            .with_to(to)
            .with_value(U256::from(9))
            .with_chain_id(5)
            .with_max_fee_per_gas(1);

        let applied = legacy_config(30).apply(request);
        assert_eq!(applied.to, Some(to.into()));
        assert_eq!(applied.value, Some(U256::from(9)));
        assert_eq!(applied.chain_id, Some(5));
        assert_eq!(applied.nonce, Some(4));
        assert_eq!(applied.gas, Some(100_000));
        assert_eq!(applied.gas_price, Some(30));
        assert_eq!(applied.max_fee_per_gas, None);
    }
}
