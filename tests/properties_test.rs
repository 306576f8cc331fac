use chargewallet::domain::{
    replay_journal, Cents, Ledger, PaymentMethod, ProviderId, TransferDirection, TransferRequest,
    WalletState,
};
use chrono::Utc;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    TopUp(Cents),
    Transfer(TransferRequest),
}

fn provider() -> impl Strategy<Value = ProviderId> {
    proptest::sample::select(ProviderId::ALL.to_vec())
}

fn direction() -> impl Strategy<Value = TransferDirection> {
    prop_oneof![
        Just(TransferDirection::ToProvider),
        Just(TransferDirection::ToMain)
    ]
}

// Includes zero and negative amounts so rejections are exercised too
fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-1_000i64..50_000).prop_map(Op::TopUp),
        (direction(), provider(), -1_000i64..150_000).prop_map(|(direction, provider, amount)| {
            Op::Transfer(TransferRequest {
                direction,
                provider,
                amount_cents: amount,
            })
        }),
    ]
}

fn initial_state() -> impl Strategy<Value = WalletState> {
    (
        0i64..1_000_000,
        proptest::collection::vec((provider(), 0i64..100_000), 0..5),
    )
        .prop_map(|(main, providers)| WalletState::seeded(main, providers).unwrap())
}

proptest! {
    #[test]
    fn prop_operations_conserve_and_never_go_negative(
        initial in initial_state(),
        ops in proptest::collection::vec(op(), 1..60),
    ) {
        let mut ledger = Ledger::new(initial.clone());
        let mut expected_total = initial.total();
        let now = Utc::now();

        for op in ops {
            let before = ledger.state().clone();
            let journal_len = ledger.journal().len();

            let result = match op {
                Op::TopUp(amount) => ledger
                    .top_up(amount, PaymentMethod::CreditCard, now)
                    .map(|_| amount),
                Op::Transfer(request) => ledger.transfer(request, now).map(|_| 0),
            };

            match result {
                Ok(added) => {
                    expected_total += added;
                    prop_assert_eq!(ledger.journal().len(), journal_len + 1);
                }
                Err(_) => {
                    prop_assert_eq!(ledger.state(), &before);
                    prop_assert_eq!(ledger.journal().len(), journal_len);
                }
            }

            prop_assert_eq!(ledger.total(), expected_total);
            prop_assert!(ledger.main_balance() >= 0);
            prop_assert!(ledger.state().provider_balances.values().all(|b| *b > 0));
        }

        // The journal alone explains the final balances
        prop_assert_eq!(&replay_journal(&initial, ledger.journal()), ledger.state());
        let sequences: Vec<u64> = ledger.journal().iter().map(|e| e.sequence).collect();
        let expected: Vec<u64> = (1..=sequences.len() as u64).collect();
        prop_assert_eq!(sequences, expected);
    }

    #[test]
    fn prop_round_trips_lose_nothing(
        initial in initial_state(),
        provider in provider(),
        amount in 1i64..10_000,
        repeats in 1usize..50,
    ) {
        prop_assume!(initial.main_balance >= amount);
        let mut ledger = Ledger::new(initial.clone());
        let now = Utc::now();
        let request = TransferRequest::to_provider(provider, amount);

        for _ in 0..repeats {
            ledger.transfer(request, now).unwrap();
            ledger.transfer(request.reversal(), now).unwrap();
        }

        prop_assert_eq!(ledger.state(), &initial);
        prop_assert_eq!(ledger.journal().len(), repeats * 2);
    }

    #[test]
    fn prop_overdraw_is_rejected(
        initial in initial_state(),
        provider in provider(),
        extra in 1i64..10_000,
    ) {
        let mut ledger = Ledger::new(initial.clone());
        let available = initial.balance(provider);

        let result = ledger.transfer(TransferRequest::to_main(provider, available + extra), Utc::now());
        prop_assert!(result.is_err());
        prop_assert_eq!(ledger.state(), &initial);
        prop_assert!(ledger.journal().is_empty());
    }
}
