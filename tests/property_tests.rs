use approx::assert_relative_eq;
use chrono::NaiveDate;
use fx_pfe_engine::core::counterparty::{CounterpartyId, TransactionId};
use fx_pfe_engine::core::currency::{CurrencyCode, CurrencyPair};
use fx_pfe_engine::core::trade::{Leg, Trade};
use fx_pfe_engine::exposure::batch::{BatchRunner, HorizonGrid};
use fx_pfe_engine::exposure::pfe::PfeCalculator;
use fx_pfe_engine::exposure::policy::Engine;
use fx_pfe_engine::exposure::vector::ExposureVector;
use fx_pfe_engine::market::basis::MarketBasis;
use fx_pfe_engine::market::risk_model::RiskModel;
use nalgebra::DMatrix;
use proptest::prelude::*;

/// Three correlated USD pairs with realistic annual vols.
fn model() -> RiskModel {
    let basis = MarketBasis::new(vec![
        CurrencyPair::new("EUR", "USD"),
        CurrencyPair::new("USD", "JPY"),
        CurrencyPair::new("GBP", "USD"),
    ]);
    let correlation = DMatrix::from_row_slice(
        3,
        3,
        &[1.0, -0.3, 0.6, -0.3, 1.0, -0.2, 0.6, -0.2, 1.0],
    );
    RiskModel::new(basis, vec![0.08, 0.10, 0.09], correlation).unwrap()
}

fn calculator(engine: Engine) -> PfeCalculator {
    PfeCalculator::for_engine(engine, 0.99).unwrap()
}

/// A currency from a pool mixing basis members and unmapped codes.
fn arb_currency() -> impl Strategy<Value = CurrencyCode> {
    prop::sample::select(vec![
        CurrencyCode::new("EUR"),
        CurrencyCode::new("USD"),
        CurrencyCode::new("JPY"),
        CurrencyCode::new("GBP"),
        CurrencyCode::new("SEK"),
        CurrencyCode::new("NOK"),
        CurrencyCode::new("MXN"),
    ])
}

/// A currency the test model has no pair for.
fn arb_unmapped_currency() -> impl Strategy<Value = CurrencyCode> {
    prop::sample::select(vec![
        CurrencyCode::new("SEK"),
        CurrencyCode::new("NOK"),
        CurrencyCode::new("MXN"),
        CurrencyCode::new("ZAR"),
    ])
}

/// A notional between 10k and 100m.
fn arb_notional() -> impl Strategy<Value = f64> {
    (1u32..10_000u32).prop_map(|units| f64::from(units) * 10_000.0)
}

fn arb_collateral() -> impl Strategy<Value = f64> {
    (0u32..5_000_000u32).prop_map(f64::from)
}

fn forward(buy: Leg, sell: Leg, collateral: f64) -> Trade {
    Trade::new(
        TransactionId::new(10_000_001),
        CounterpartyId::new(50_000),
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
        NaiveDate::from_ymd_opt(2024, 6, 28).unwrap(),
        buy,
        sell,
    )
    .with_collateral_factor(collateral)
}

/// A forward whose legs are distinct currencies from the mixed pool.
fn arb_trade() -> impl Strategy<Value = Trade> {
    (
        arb_currency(),
        arb_currency(),
        arb_notional(),
        arb_notional(),
        arb_collateral(),
    )
        .prop_filter_map("legs must differ", |(buy, sell, bn, sn, collateral)| {
            if buy == sell {
                None
            } else {
                Some(forward(Leg::new(buy, bn), Leg::new(sell, sn), collateral))
            }
        })
}

fn arb_engine() -> impl Strategy<Value = Engine> {
    prop::sample::select(Engine::ALL.to_vec())
}

proptest! {
    // ===================================================================
    // INVARIANT 1: A trade touching no basis currency carries no PFE.
    //
    // Its exposure vector is all zeros, so every horizon reports (0, 0)
    // regardless of engine or collateral.
    // ===================================================================
    #[test]
    fn unmapped_trades_have_zero_pfe(
        buy in arb_unmapped_currency(),
        sell in arb_unmapped_currency(),
        notional in arb_notional(),
        collateral in arb_collateral(),
        engine in arb_engine(),
    ) {
        prop_assume!(buy != sell);
        let model = model();
        let trade = forward(Leg::new(buy, notional), Leg::new(sell, notional), collateral);
        let runner = BatchRunner::new(&model, calculator(engine), HorizonGrid::default());

        for result in runner.results_for_trade(&trade) {
            prop_assert_eq!(result.uncollateralized_pfe, 0.0);
            prop_assert_eq!(result.collateralized_pfe, 0.0);
        }
    }

    // ===================================================================
    // INVARIANT 2: Collateral can only reduce PFE, never below zero.
    // ===================================================================
    #[test]
    fn collateralized_bounded_by_uncollateralized(
        trade in arb_trade(),
        engine in arb_engine(),
        days in 1u32..=30,
    ) {
        let model = model();
        let exposure = model.exposure(&trade);
        let outcome = calculator(engine).calculate(
            &exposure,
            days,
            model.covariance(),
            trade.collateral_factor(),
        );
        prop_assert!(outcome.uncollateralized >= 0.0);
        prop_assert!(outcome.collateralized >= 0.0);
        prop_assert!(outcome.collateralized <= outcome.uncollateralized);
    }

    // ===================================================================
    // INVARIANT 3: Without collateral both figures coincide.
    // ===================================================================
    #[test]
    fn zero_collateral_leaves_pfe_unchanged(
        trade in arb_trade(),
        engine in arb_engine(),
        days in 1u32..=30,
    ) {
        let model = model();
        let trade = trade.with_collateral_factor(0.0);
        let outcome = calculator(engine).calculate(
            &model.exposure(&trade),
            days,
            model.covariance(),
            0.0,
        );
        prop_assert_eq!(outcome.collateralized, outcome.uncollateralized);
    }

    // ===================================================================
    // INVARIANT 4: F22 variance is linear in the horizon.
    //
    // Doubling the number of days doubles the variance, so PFE grows by
    // exactly √2.
    // ===================================================================
    #[test]
    fn f22_variance_linear_in_days(trade in arb_trade(), days in 1u32..=15) {
        let model = model();
        let calc = calculator(Engine::F22);
        let exposure = model.exposure(&trade);
        let single = calc.horizon_variance(&exposure, days, model.covariance());
        let double = calc.horizon_variance(&exposure, days * 2, model.covariance());
        assert_relative_eq!(double, 2.0 * single, max_relative = 1e-9);
    }

    // ===================================================================
    // INVARIANT 5: Inside one year QUIC is never below F22.
    //
    // √(d/365) ≥ d/365 for d < 365 and QUIC carries a 1.1 multiplier.
    // ===================================================================
    #[test]
    fn quic_dominates_f22_within_a_year(trade in arb_trade(), days in 1u32..365) {
        let model = model();
        let exposure = model.exposure(&trade);
        let f22 = calculator(Engine::F22).calculate(&exposure, days, model.covariance(), 0.0);
        let quic = calculator(Engine::Quic).calculate(&exposure, days, model.covariance(), 0.0);
        prop_assert!(quic.uncollateralized >= f22.uncollateralized);
    }

    // ===================================================================
    // INVARIANT 6: The zero vector has zero PFE on every horizon.
    // ===================================================================
    #[test]
    fn zero_exposure_is_zero_pfe(
        engine in arb_engine(),
        days in 1u32..=30,
        collateral in arb_collateral(),
    ) {
        let model = model();
        let zero = ExposureVector::zeros(model.basis());
        let outcome = calculator(engine).calculate(&zero, days, model.covariance(), collateral);
        prop_assert_eq!(outcome.uncollateralized, 0.0);
        prop_assert_eq!(outcome.collateralized, 0.0);
    }

    // ===================================================================
    // INVARIANT 7: Batch output depends only on its inputs.
    //
    // Two runs over the same book are identical, one row per trade and
    // horizon, trade-major and day-ascending.
    // ===================================================================
    #[test]
    fn batch_is_idempotent(
        trades in prop::collection::vec(arb_trade(), 1..20),
        engine in arb_engine(),
        max_days in 1u32..=30,
    ) {
        let model = model();
        let runner = BatchRunner::new(&model, calculator(engine), HorizonGrid::up_to(max_days));
        let first = runner.run(&trades);
        prop_assert_eq!(&first, &runner.run(&trades));
        prop_assert_eq!(first.len(), trades.len() * max_days as usize);

        for (chunk, trade) in first.chunks(max_days as usize).zip(&trades) {
            prop_assert!(chunk.iter().all(|r| r.transaction_id == trade.transaction_id()));
            let days: Vec<u32> = chunk.iter().map(|r| r.days).collect();
            prop_assert_eq!(days, (1..=max_days).collect::<Vec<_>>());
        }
    }
}
