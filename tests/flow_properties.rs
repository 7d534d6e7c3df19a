use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use token_flow::analysis::{
    classify_exchange_flow, compose_flow, estimate_flow, summarize_flow, MultiHorizonFlow,
};
use token_flow::data::{FlowDirection, Sentiment, TokenSnapshot};

/// Signed percent change with two decimals, -1000.00 to 1000.00
fn price_change() -> impl Strategy<Value = Decimal> {
    (-100_000i64..=100_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn volume() -> impl Strategy<Value = Decimal> {
    (0u64..1_000_000_000_000).prop_map(Decimal::from)
}

fn snapshot() -> impl Strategy<Value = TokenSnapshot> {
    (price_change(), price_change(), price_change(), volume())
        .prop_map(|(c1, c24, c7, vol)| TokenSnapshot::new("token", c1, c24, c7, vol))
}

proptest! {
    #[test]
    fn prop_flow_sign_follows_price(change in price_change(), vol in volume()) {
        let result = estimate_flow(change, vol, None);

        prop_assert_eq!(result.direction, FlowDirection::from_sign(change));
        if change > Decimal::ZERO && vol > Decimal::ZERO {
            prop_assert!(result.flow_amount > Decimal::ZERO);
        }
        if change < Decimal::ZERO && vol > Decimal::ZERO {
            prop_assert!(result.flow_amount < Decimal::ZERO);
        }
        if change.is_zero() || vol.is_zero() {
            prop_assert!(result.flow_amount.is_zero());
        }
    }

    #[test]
    fn prop_flow_formula(change in price_change(), vol in volume()) {
        let result = estimate_flow(change, vol, None);
        let ratio = (change.abs() / dec!(100)).min(dec!(0.3));

        prop_assert_eq!(result.flow_amount.abs(), vol * ratio);
        prop_assert!(result.flow_amount.abs() <= vol * dec!(0.3));
    }

    #[test]
    fn prop_volatility_is_ignored(change in price_change(), vol in volume(), sigma in volume()) {
        prop_assert_eq!(estimate_flow(change, vol, None), estimate_flow(change, vol, Some(sigma)));
    }

    #[test]
    fn prop_confidence_bounded_and_monotonic(a in price_change(), b in price_change(), vol in volume()) {
        let ra = estimate_flow(a, vol, None);
        let rb = estimate_flow(b, vol, None);

        prop_assert!((0.0..=1.0).contains(&ra.confidence));
        prop_assert!((0.0..=1.0).contains(&rb.confidence));
        if a.abs() <= b.abs() {
            prop_assert!(ra.confidence <= rb.confidence);
        }
    }

    #[test]
    fn prop_composed_sentiment_is_known(token in snapshot()) {
        let flow: MultiHorizonFlow = compose_flow(&token);

        prop_assert_ne!(flow.overall_sentiment, Sentiment::Unknown);
        prop_assert_eq!(flow.one_day.window_volume, token.volume_24h);
        prop_assert_eq!(flow.seven_days.window_volume, token.volume_24h * Decimal::from(7));
    }

    #[test]
    fn prop_portfolio_summary_invariants(tokens in prop::collection::vec(snapshot(), 0..30)) {
        let summary = summarize_flow(&tokens);

        prop_assert!((0.0..=1.0).contains(&summary.flow_ratio));
        prop_assert_eq!(summary.net_flow, summary.total_inflow - summary.total_outflow);
        prop_assert!(summary.inflow_tokens.len() <= 5);
        prop_assert!(summary.outflow_tokens.len() <= 5);
        prop_assert!(summary.total_inflow >= Decimal::ZERO);
        prop_assert!(summary.total_outflow >= Decimal::ZERO);
        if summary.total_inflow.is_zero() && summary.total_outflow.is_zero() {
            prop_assert_eq!(summary.flow_ratio, 0.5);
        }
    }

    #[test]
    fn prop_exchange_buy_ratio_bounds(bid in 0u64..10_000_000, ask in 0u64..10_000_000) {
        let record = classify_exchange_flow(Decimal::from(bid), Decimal::from(ask), Decimal::from(bid + ask));

        if bid == 0 || ask == 0 {
            prop_assert!(record.is_none());
        } else {
            let record = record.unwrap();
            prop_assert!(record.buy_ratio > 0.0 && record.buy_ratio < 1.0);
            prop_assert!((0.5..=1.0).contains(&record.confidence));
            match record.direction {
                FlowDirection::Inflow => prop_assert!(record.buy_ratio > 0.6),
                FlowDirection::Outflow => prop_assert!(record.buy_ratio < 0.4),
                FlowDirection::Balanced => prop_assert_eq!(record.confidence, 0.5),
            }
        }
    }
}
