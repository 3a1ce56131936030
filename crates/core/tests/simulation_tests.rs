// ═══════════════════════════════════════════════════════════════════
// Simulation Tests — lump sum, daily investing, rebalancing, windows
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;

use fund_backtest_core::errors::CoreError;
use fund_backtest_core::models::fund::{FundData, FundSeries, NavPoint};
use fund_backtest_core::models::portfolio::PortfolioConfig;
use fund_backtest_core::models::settings::{InvestmentMode, RangeWindow, SimulationParams};
use fund_backtest_core::services::simulation_service::SimulationService;
use fund_backtest_core::util::calendar::add_days;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn series(points: &[(NaiveDate, f64)]) -> FundSeries {
    FundSeries::new(points.iter().map(|(d, n)| NavPoint::new(*d, *n)).collect())
}

/// One NAV per calendar day starting at `start`.
fn daily_series(start: NaiveDate, navs: &[f64]) -> FundSeries {
    FundSeries::new(
        navs.iter()
            .enumerate()
            .map(|(i, n)| NavPoint::new(add_days(start, i as i64), *n))
            .collect(),
    )
}

fn params(start: NaiveDate, capital: f64, daily: f64) -> SimulationParams {
    SimulationParams {
        start_date: start,
        initial_capital: capital,
        daily_amount: daily,
    }
}

fn data(entries: Vec<(&str, FundSeries)>) -> FundData {
    entries.into_iter().map(|(c, s)| (c.to_string(), s)).collect()
}

fn run(
    config: &PortfolioConfig,
    data: &FundData,
    params: &SimulationParams,
    mode: InvestmentMode,
    range: RangeWindow,
) -> Option<fund_backtest_core::models::simulation::SimulationResult> {
    SimulationService::new()
        .calculate_portfolio(config, data, params, mode, range)
        .unwrap()
}

mod lump_sum {
    use super::*;

    #[test]
    fn flat_nav_keeps_value_and_cost() {
        let fund = data(vec![("000001", daily_series(d(2024, 1, 1), &[1.5; 10]))]);
        let config = PortfolioConfig::new("A").with_fund("000001", 100.0);
        let result = run(
            &config,
            &fund,
            &params(d(2024, 1, 1), 10_000.0, 0.0),
            InvestmentMode::LumpSum,
            RangeWindow::Unlimited,
        )
        .unwrap();

        assert_eq!(result.curve.len(), 10);
        for p in &result.curve {
            assert!((p.value - 10_000.0).abs() < 1e-6);
            assert_eq!(p.cost, 10_000.0);
            assert!((p.unit_nav - 1.0).abs() < 1e-12);
            assert_eq!(p.drawdown, 0.0);
        }
        assert!(result.metrics.total_return.abs() < 1e-9);
        assert_eq!(result.metrics.max_drawdown, 0.0);
        assert_eq!(result.metrics.sharpe, 0.0);
        assert!(!result.drawdown_window.has_drawdown);
    }

    #[test]
    fn value_tracks_nav() {
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &[1.0, 1.1, 0.99, 1.2]))]);
        let config = PortfolioConfig::new("A").with_fund("X", 1.0);
        let result = run(
            &config,
            &fund,
            &params(d(2024, 1, 1), 1_000.0, 0.0),
            InvestmentMode::LumpSum,
            RangeWindow::Unlimited,
        )
        .unwrap();

        let values: Vec<f64> = result.curve.iter().map(|p| p.value).collect();
        for (got, want) in values.iter().zip([1_000.0, 1_100.0, 990.0, 1_200.0]) {
            assert!((got - want).abs() < 1e-6, "{got} vs {want}");
        }
        assert!((result.curve[2].drawdown + 10.0).abs() < 1e-9);
        assert!((result.metrics.total_return - 20.0).abs() < 1e-9);
        assert_eq!(result.drawdown_window.recovery_date, Some(d(2024, 1, 4)));
    }

    #[test]
    fn cash_flows_end_with_final_value() {
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &[1.0, 1.0, 2.0]))]);
        let config = PortfolioConfig::new("A").with_fund("X", 1.0);
        let result = run(
            &config,
            &fund,
            &params(d(2024, 1, 1), 500.0, 0.0),
            InvestmentMode::LumpSum,
            RangeWindow::Unlimited,
        )
        .unwrap();

        assert_eq!(result.cash_flows.len(), 2);
        assert_eq!(result.cash_flows[0].amount, -500.0);
        assert_eq!(result.cash_flows[1].date, d(2024, 1, 3));
        assert!((result.cash_flows[1].amount - 1_000.0).abs() < 1e-6);
    }
}

mod daily {
    use super::*;

    #[test]
    fn cost_grows_by_daily_amount() {
        let navs: Vec<f64> = (0..20).map(|i| 1.0 + i as f64 * 0.0001).collect();
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &navs))]);
        let config = PortfolioConfig::new("A").with_fund("X", 1.0);
        let result = run(
            &config,
            &fund,
            &params(d(2024, 1, 1), 0.0, 40.0),
            InvestmentMode::Daily,
            RangeWindow::Unlimited,
        )
        .unwrap();

        for (i, p) in result.curve.iter().enumerate() {
            assert!((p.cost - 40.0 * (i + 1) as f64).abs() < 1e-9);
        }
        let last = result.final_point().unwrap();
        assert!(last.value > last.cost);
        assert!(result.metrics.irr > 0.0);
        assert_eq!(result.cash_flows.len(), 21);
    }

    #[test]
    fn doubling_nav_gives_positive_return() {
        let navs: Vec<f64> = (0..=100).map(|i| 1.0 + i as f64 / 100.0).collect();
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &navs))]);
        let config = PortfolioConfig::new("A").with_fund("X", 1.0);
        let result = run(
            &config,
            &fund,
            &params(d(2024, 1, 1), 0.0, 40.0),
            InvestmentMode::Daily,
            RangeWindow::Unlimited,
        )
        .unwrap();

        for pair in result.curve.windows(2) {
            assert!((pair[1].cost - pair[0].cost - 40.0).abs() < 1e-9);
        }
        assert!(result.metrics.total_return > 0.0);
        assert_eq!(result.metrics.max_drawdown, 0.0);
    }

    #[test]
    fn amount_below_minimum_is_lifted() {
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &[1.0; 5]))]);
        let config = PortfolioConfig::new("A").with_fund("X", 1.0);
        let result = run(
            &config,
            &fund,
            &params(d(2024, 1, 1), 0.0, 5.0),
            InvestmentMode::Daily,
            RangeWindow::Unlimited,
        )
        .unwrap();

        assert_eq!(result.curve[0].cost, 40.0);
        assert_eq!(result.curve[4].cost, 200.0);
    }

    #[test]
    fn initial_capital_is_added_on_first_day() {
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &[1.0; 3]))]);
        let config = PortfolioConfig::new("A").with_fund("X", 1.0);
        let result = run(
            &config,
            &fund,
            &params(d(2024, 1, 1), 1_000.0, 100.0),
            InvestmentMode::Daily,
            RangeWindow::Unlimited,
        )
        .unwrap();

        assert_eq!(result.curve[0].cost, 1_100.0);
        assert_eq!(result.curve[2].cost, 1_300.0);
    }

    #[test]
    fn flat_nav_keeps_unit_price_at_one() {
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &[2.0; 30]))]);
        let config = PortfolioConfig::new("A").with_fund("X", 1.0);
        let result = run(
            &config,
            &fund,
            &params(d(2024, 1, 1), 0.0, 100.0),
            InvestmentMode::Daily,
            RangeWindow::Unlimited,
        )
        .unwrap();

        for p in &result.curve {
            assert!((p.unit_nav - 1.0).abs() < 1e-12);
            assert!((p.value - p.cost).abs() < 1e-6);
        }
        assert!(result.unit_returns.iter().all(|r| r.abs() < 1e-12));
        assert_eq!(result.metrics.volatility, 0.0);
    }

    #[test]
    fn flat_multi_fund_portfolio_has_no_volatility() {
        let start = d(2023, 1, 1);
        let fund = data(vec![
            ("F1", daily_series(start, &[1.37; 400])),
            ("F2", daily_series(start, &[2.11; 400])),
            ("F3", daily_series(start, &[0.733; 400])),
        ]);
        let config = PortfolioConfig::new("A")
            .with_fund("F1", 33.0)
            .with_fund("F2", 27.0)
            .with_fund("F3", 40.0);
        let result = run(
            &config,
            &fund,
            &params(start, 10_000.0, 100.0),
            InvestmentMode::Daily,
            RangeWindow::Unlimited,
        )
        .unwrap();

        // Unit prices carry rounding noise; it must not surface as risk.
        assert_eq!(result.metrics.volatility, 0.0);
        assert_eq!(result.metrics.sharpe, 0.0);
        assert_eq!(result.metrics.max_drawdown, 0.0);
    }

    #[test]
    fn contributions_do_not_move_unit_price() {
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &[1.0, 1.1, 1.21]))]);
        let config = PortfolioConfig::new("A").with_fund("X", 1.0);
        let result = run(
            &config,
            &fund,
            &params(d(2024, 1, 1), 0.0, 100.0),
            InvestmentMode::Daily,
            RangeWindow::Unlimited,
        )
        .unwrap();

        // Unit price follows the fund regardless of new money.
        assert!((result.curve[1].unit_nav - 1.1).abs() < 1e-9);
        assert!((result.curve[2].unit_nav - 1.21).abs() < 1e-9);
    }
}

mod rebalancing {
    use super::*;

    fn two_funds() -> FundData {
        data(vec![
            (
                "X",
                series(&[
                    (d(2024, 1, 1), 1.0),
                    (d(2024, 1, 31), 2.0),
                    (d(2024, 2, 1), 2.0),
                    (d(2024, 2, 2), 3.0),
                ]),
            ),
            ("Y", series(&[(d(2024, 1, 1), 1.0), (d(2024, 2, 2), 1.0)])),
        ])
    }

    #[test]
    fn resets_weights_on_month_change() {
        let config = PortfolioConfig::new("A").with_fund("X", 50.0).with_fund("Y", 50.0);
        let result = run(
            &config,
            &two_funds(),
            &params(d(2024, 1, 1), 10_000.0, 0.0),
            InvestmentMode::LumpSum,
            RangeWindow::Unlimited,
        )
        .unwrap();

        assert_eq!(result.curve.len(), 33);
        let on = |date: NaiveDate| result.curve.iter().find(|p| p.date == date).unwrap();
        assert!((on(d(2024, 1, 15)).value - 10_000.0).abs() < 1e-6);
        assert!((on(d(2024, 1, 31)).value - 15_000.0).abs() < 1e-6);
        assert!((on(d(2024, 2, 1)).value - 15_000.0).abs() < 1e-6);
        // Without the reset this would be 20 000.
        assert!((on(d(2024, 2, 2)).value - 18_750.0).abs() < 1e-6);
    }

    #[test]
    fn weights_are_normalised() {
        let a = PortfolioConfig::new("A").with_fund("X", 1.0).with_fund("Y", 1.0);
        let b = PortfolioConfig::new("B").with_fund("X", 30.0).with_fund("Y", 30.0);
        let p = params(d(2024, 1, 1), 10_000.0, 0.0);
        let ra = run(&a, &two_funds(), &p, InvestmentMode::LumpSum, RangeWindow::Unlimited).unwrap();
        let rb = run(&b, &two_funds(), &p, InvestmentMode::LumpSum, RangeWindow::Unlimited).unwrap();
        assert_eq!(ra.curve, rb.curve);
    }

    #[test]
    fn duplicate_codes_pool_weight() {
        let split = PortfolioConfig::new("A")
            .with_fund("X", 25.0)
            .with_fund("Y", 50.0)
            .with_fund("X", 25.0);
        let pooled = PortfolioConfig::new("B").with_fund("X", 50.0).with_fund("Y", 50.0);
        let p = params(d(2024, 1, 1), 10_000.0, 0.0);
        let r1 = run(&split, &two_funds(), &p, InvestmentMode::LumpSum, RangeWindow::Unlimited).unwrap();
        let r2 = run(&pooled, &two_funds(), &p, InvestmentMode::LumpSum, RangeWindow::Unlimited).unwrap();
        assert_eq!(r1.curve, r2.curve);
        assert_eq!(r1.funds_used, vec!["X".to_string(), "Y".to_string()]);
    }
}

mod alignment_and_windows {
    use super::*;

    #[test]
    fn starts_when_every_fund_has_a_price() {
        let fund = data(vec![
            ("OLD", daily_series(d(2024, 1, 1), &[1.0; 10])),
            ("NEW", daily_series(d(2024, 1, 5), &[1.0; 6])),
        ]);
        let config = PortfolioConfig::new("A").with_fund("OLD", 1.0).with_fund("NEW", 1.0);
        let result = run(
            &config,
            &fund,
            &params(d(2023, 6, 1), 1_000.0, 0.0),
            InvestmentMode::LumpSum,
            RangeWindow::Unlimited,
        )
        .unwrap();
        assert_eq!(result.first_date(), Some(d(2024, 1, 5)));
        assert_eq!(result.last_date(), Some(d(2024, 1, 10)));
    }

    #[test]
    fn start_date_cuts_history() {
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &[1.0; 10]))]);
        let config = PortfolioConfig::new("A").with_fund("X", 1.0);
        let result = run(
            &config,
            &fund,
            &params(d(2024, 1, 4), 1_000.0, 0.0),
            InvestmentMode::LumpSum,
            RangeWindow::Unlimited,
        )
        .unwrap();
        assert_eq!(result.first_date(), Some(d(2024, 1, 4)));
        assert_eq!(result.curve.len(), 7);
    }

    #[test]
    fn weekend_gaps_are_filled() {
        let fund = data(vec![(
            "X",
            series(&[(d(2024, 1, 5), 1.0), (d(2024, 1, 8), 1.2)]),
        )]);
        let config = PortfolioConfig::new("A").with_fund("X", 1.0);
        let result = run(
            &config,
            &fund,
            &params(d(2024, 1, 1), 100.0, 0.0),
            InvestmentMode::LumpSum,
            RangeWindow::Unlimited,
        )
        .unwrap();
        assert_eq!(result.curve.len(), 4);
        assert!((result.curve[2].value - 100.0).abs() < 1e-9);
        assert!((result.curve[3].value - 120.0).abs() < 1e-9);
    }

    #[test]
    fn one_month_window_keeps_trailing_days() {
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &[1.0; 91]))]);
        let config = PortfolioConfig::new("A").with_fund("X", 1.0);
        let result = run(
            &config,
            &fund,
            &params(d(2024, 1, 1), 1_000.0, 0.0),
            InvestmentMode::LumpSum,
            RangeWindow::OneMonth,
        )
        .unwrap();
        assert_eq!(result.last_date(), Some(d(2024, 3, 31)));
        assert_eq!(result.first_date(), Some(d(2024, 3, 1)));
        assert_eq!(result.curve.len(), 31);
        // Capital is invested at the start of the window.
        assert_eq!(result.curve[0].cost, 1_000.0);
    }

    #[test]
    fn window_longer_than_history_keeps_everything() {
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &[1.0; 10]))]);
        let config = PortfolioConfig::new("A").with_fund("X", 1.0);
        let p = params(d(2024, 1, 1), 1_000.0, 0.0);
        let windowed = run(&config, &fund, &p, InvestmentMode::LumpSum, RangeWindow::FiveYears).unwrap();
        let all = run(&config, &fund, &p, InvestmentMode::LumpSum, RangeWindow::Unlimited).unwrap();
        assert_eq!(windowed.curve, all.curve);
    }
}

mod degenerate_input {
    use super::*;

    #[test]
    fn no_data_gives_none() {
        let config = PortfolioConfig::new("A").with_fund("X", 1.0);
        let result = run(
            &config,
            &FundData::new(),
            &SimulationParams::default(),
            InvestmentMode::LumpSum,
            RangeWindow::Unlimited,
        );
        assert!(result.is_none());
    }

    #[test]
    fn empty_portfolio_gives_none() {
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &[1.0; 5]))]);
        let result = run(
            &PortfolioConfig::new("A"),
            &fund,
            &params(d(2024, 1, 1), 1_000.0, 0.0),
            InvestmentMode::LumpSum,
            RangeWindow::Unlimited,
        );
        assert!(result.is_none());
    }

    #[test]
    fn single_day_gives_none() {
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &[1.0]))]);
        let config = PortfolioConfig::new("A").with_fund("X", 1.0);
        let result = run(
            &config,
            &fund,
            &params(d(2024, 1, 1), 1_000.0, 0.0),
            InvestmentMode::LumpSum,
            RangeWindow::Unlimited,
        );
        assert!(result.is_none());
    }

    #[test]
    fn start_after_last_nav_gives_none() {
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &[1.0; 5]))]);
        let config = PortfolioConfig::new("A").with_fund("X", 1.0);
        let result = run(
            &config,
            &fund,
            &params(d(2025, 1, 1), 1_000.0, 0.0),
            InvestmentMode::LumpSum,
            RangeWindow::Unlimited,
        );
        assert!(result.is_none());
    }

    #[test]
    fn zero_weights_give_none() {
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &[1.0; 5]))]);
        let config = PortfolioConfig::new("A").with_fund("X", 0.0);
        let result = run(
            &config,
            &fund,
            &params(d(2024, 1, 1), 1_000.0, 0.0),
            InvestmentMode::LumpSum,
            RangeWindow::Unlimited,
        );
        assert!(result.is_none());
    }

    #[test]
    fn fund_without_data_is_left_out() {
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &[1.0, 1.0, 2.0]))]);
        let config = PortfolioConfig::new("A").with_fund("X", 50.0).with_fund("MISSING", 50.0);
        let result = run(
            &config,
            &fund,
            &params(d(2024, 1, 1), 1_000.0, 0.0),
            InvestmentMode::LumpSum,
            RangeWindow::Unlimited,
        )
        .unwrap();
        assert_eq!(result.funds_used, vec!["X".to_string()]);
        // All capital went to X.
        assert!((result.curve[2].value - 2_000.0).abs() < 1e-6);
    }

    #[test]
    fn invalid_params_are_rejected() {
        let fund = data(vec![("X", daily_series(d(2024, 1, 1), &[1.0; 5]))]);
        let config = PortfolioConfig::new("A").with_fund("X", 1.0);
        let svc = SimulationService::new();

        let err = svc
            .calculate_portfolio(
                &config,
                &fund,
                &params(d(2024, 1, 1), -1.0, 0.0),
                InvestmentMode::LumpSum,
                RangeWindow::Unlimited,
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));

        let err = svc
            .calculate_portfolio(
                &config,
                &fund,
                &params(d(2024, 1, 1), 1_000.0, f64::NAN),
                InvestmentMode::Daily,
                RangeWindow::Unlimited,
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));

        let bad_weight = PortfolioConfig::new("A").with_fund("X", -5.0);
        let err = svc
            .calculate_portfolio(
                &bad_weight,
                &fund,
                &params(d(2024, 1, 1), 1_000.0, 0.0),
                InvestmentMode::LumpSum,
                RangeWindow::Unlimited,
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let navs: Vec<f64> = (0..60).map(|i| 1.0 + (i as f64 * 0.3).sin() * 0.1).collect();
        let fund = data(vec![
            ("X", daily_series(d(2024, 1, 1), &navs)),
            ("Y", daily_series(d(2024, 1, 1), &[1.0; 60])),
        ]);
        let config = PortfolioConfig::new("A").with_fund("X", 70.0).with_fund("Y", 30.0);
        let p = params(d(2024, 1, 1), 5_000.0, 50.0);
        let first = run(&config, &fund, &p, InvestmentMode::Daily, RangeWindow::Unlimited);
        let second = run(&config, &fund, &p, InvestmentMode::Daily, RangeWindow::Unlimited);
        assert_eq!(first, second);
    }
}
