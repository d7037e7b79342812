use assert_approx_eq::assert_approx_eq;
use sales_forecast::data::TransactionData;
use sales_forecast::error::ForecastError;
use sales_forecast::revenue::RevenueEstimator;

/// Multiplicative sales history: total = qty * price * unit factor,
/// which the log-linear model fits exactly
fn sales_history() -> TransactionData {
    let quantities = [10.0, 20.0, 5.0, 40.0, 8.0, 50.0, 12.0, 30.0, 6.0];
    let prices = [100.0, 250.0, 80.0, 40.0, 500.0, 120.0, 60.0, 90.0, 300.0];
    let units = ["pcs", "stell", "paket", "pcs", "stell", "paket", "pcs", "stell", "paket"];

    let factor = |unit: &str| match unit {
        "stell" => 1.5,
        "paket" => 2.0,
        _ => 1.0,
    };

    let totals: Vec<Option<f64>> = quantities
        .iter()
        .zip(prices.iter())
        .zip(units.iter())
        .map(|((q, p), u)| Some(q * p * factor(u)))
        .collect();

    TransactionData::from_sales(
        quantities.iter().map(|&q| Some(q)).collect(),
        prices.iter().map(|&p| Some(p)).collect(),
        units.to_vec(),
        totals,
    )
    .unwrap()
}

#[test]
fn test_estimate_recovers_multiplicative_relationship() {
    let estimator = RevenueEstimator::fit(&sales_history()).unwrap();

    assert_approx_eq!(
        estimator.estimate(Some(10.0), Some(100.0), "pcs"),
        1000.0,
        1e-4
    );
    assert_approx_eq!(
        estimator.estimate(Some(10.0), Some(100.0), "stell"),
        1500.0,
        1e-4
    );
    assert_approx_eq!(
        estimator.estimate(Some(10.0), Some(100.0), "paket"),
        2000.0,
        1e-4
    );
}

#[test]
fn test_estimate_is_always_positive() {
    let estimator = RevenueEstimator::fit(&sales_history()).unwrap();

    for qty in [0.001, 1.0, 1_000_000.0] {
        for price in [0.001, 1.0, 1_000_000.0] {
            assert!(estimator.estimate(Some(qty), Some(price), "pcs") > 0.0);
        }
    }
}

#[test]
fn test_estimate_is_row_order_independent() {
    let data = sales_history();
    let forward = RevenueEstimator::fit(&data).unwrap();

    let df = data.dataframe().reverse();
    let backward = RevenueEstimator::fit(&TransactionData::from_dataframe(df)).unwrap();

    assert_approx_eq!(
        forward.estimate(Some(15.0), Some(200.0), "stell"),
        backward.estimate(Some(15.0), Some(200.0), "stell"),
        1e-6
    );
}

#[test]
fn test_unknown_unit_type_falls_back_to_baseline() {
    let estimator = RevenueEstimator::fit(&sales_history()).unwrap();

    // "paket" sorts first and is the baseline; unknown categories encode
    // identically, without an error
    assert_eq!(estimator.unit_types()[0], "paket");
    assert_approx_eq!(
        estimator.estimate(Some(10.0), Some(100.0), "no-such-unit"),
        estimator.estimate(Some(10.0), Some(100.0), "paket"),
        1e-9
    );
}

#[test]
fn test_missing_inputs_fall_back_to_training_medians() {
    let estimator = RevenueEstimator::fit(&sales_history()).unwrap();

    let defaulted = estimator.estimate(None, None, "pcs");
    assert!(defaulted > 0.0);

    // Non-positive inputs are treated as absent, never fed into a log
    let clamped = estimator.estimate(Some(0.0), Some(-5.0), "pcs");
    assert_approx_eq!(defaulted, clamped, 1e-9);
}

#[test]
fn test_missing_prices_are_imputed_with_median() {
    let data = TransactionData::from_sales(
        vec![Some(10.0), Some(20.0), Some(30.0), Some(40.0)],
        vec![Some(100.0), None, Some(300.0), None],
        vec!["pcs", "pcs", "stell", "stell"],
        vec![Some(1000.0), Some(2000.0), Some(9000.0), Some(8000.0)],
    )
    .unwrap();

    let estimator = RevenueEstimator::fit(&data).unwrap();

    assert_eq!(estimator.drop_stats().dropped_rows, 0);
    assert!(estimator.estimate(Some(10.0), None, "pcs") > 0.0);
}

#[test]
fn test_fit_drops_invalid_rows_and_counts_them() {
    let data = TransactionData::from_sales(
        vec![Some(10.0), Some(-3.0), None, Some(20.0)],
        vec![Some(100.0), Some(50.0), Some(60.0), Some(80.0)],
        vec!["pcs", "pcs", "stell", "stell"],
        vec![Some(1000.0), Some(150.0), Some(120.0), Some(1600.0)],
    )
    .unwrap();

    let estimator = RevenueEstimator::fit(&data).unwrap();

    assert_eq!(estimator.drop_stats().total_rows, 4);
    assert_eq!(estimator.drop_stats().dropped_rows, 2);
}

#[test]
fn test_fit_fails_on_unusable_history() {
    let empty = TransactionData::from_sales(vec![], vec![], vec![], vec![]).unwrap();
    assert!(matches!(
        RevenueEstimator::fit(&empty),
        Err(ForecastError::InsufficientData(_))
    ));

    let all_invalid = TransactionData::from_sales(
        vec![Some(-1.0), None],
        vec![Some(10.0), Some(20.0)],
        vec!["pcs", "pcs"],
        vec![Some(100.0), Some(200.0)],
    )
    .unwrap();
    assert!(matches!(
        RevenueEstimator::fit(&all_invalid),
        Err(ForecastError::InsufficientData(_))
    ));
}

#[test]
fn test_fit_fails_on_missing_columns() {
    let data = TransactionData::from_orders(vec!["2023-01-01"], vec![10.0]).unwrap();

    assert!(matches!(
        RevenueEstimator::fit(&data),
        Err(ForecastError::MissingColumns { .. })
    ));
}
