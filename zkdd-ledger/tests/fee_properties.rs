use proptest::prelude::*;
use zkdd_ledger::{calculate_dual_fee, calculate_fee, FeeMode, FeePolicy};

proptest! {
    #[test]
    fn single_fee_and_net_sum_to_amount(amount in any::<u128>(), divider in 1u128..100_000) {
        let (fee, net) = calculate_fee(amount, divider);
        prop_assert_eq!(fee + net, amount);
        prop_assert_eq!(fee, amount / divider);
    }

    #[test]
    fn dual_parts_sum_to_amount(amount in any::<u128>(), divider in 2u128..100_000) {
        let split = calculate_dual_fee(amount, divider);
        prop_assert_eq!(split.protocol_fee, split.relayer_fee);
        prop_assert_eq!(split.total_fee() + split.net, amount);
    }

    #[test]
    fn policy_split_never_exceeds_amount(
        amount in 0u128..=u64::MAX as u128,
        dual in any::<bool>(),
        divider in 2u128..10_000,
    ) {
        let mode = if dual { FeeMode::Dual } else { FeeMode::Single };
        let split = FeePolicy::new(mode, divider).unwrap().split(amount);
        prop_assert!(split.net <= amount);
        prop_assert_eq!(split.protocol_fee + split.relayer_fee + split.net, amount);
    }
}
