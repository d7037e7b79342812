use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rstest::rstest;
use sales_forecast::data::TransactionData;
use sales_forecast::series::{
    next_quarter_start, quarter_start, QuarterlySeries, DEFAULT_LAG,
    DEFAULT_OUTLIER_Z_THRESHOLD, MIN_POINTS_FOR_FILTERING,
};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

#[rstest]
#[case("2023-01-15", "2023-01-01")]
#[case("2023-03-31", "2023-01-01")]
#[case("2023-04-01", "2023-04-01")]
#[case("2023-08-20", "2023-07-01")]
#[case("2023-12-31", "2023-10-01")]
fn test_quarter_start(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(quarter_start(date(input)), date(expected));
}

#[rstest]
#[case("2023-02-15", "2023-04-01")]
#[case("2023-04-01", "2023-07-01")]
#[case("2023-11-05", "2024-01-01")]
fn test_next_quarter_start(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(next_quarter_start(date(input)), date(expected));
}

#[test]
fn test_aggregate_sums_by_quarter() {
    let data = TransactionData::from_orders(
        vec!["2023-01-05", "2023-02-20", "2023-05-10", "2023-06-15"],
        vec![10.0, 15.0, 20.0, 5.0],
    )
    .unwrap();

    let (series, stats) = QuarterlySeries::aggregate(&data).unwrap();

    assert_eq!(stats.dropped_rows, 0);
    assert_eq!(series.len(), 2);
    assert_eq!(series.points()[0].date, date("2023-01-01"));
    assert_eq!(series.points()[0].quantity, 25.0);
    assert_eq!(series.points()[1].date, date("2023-04-01"));
    assert_eq!(series.points()[1].quantity, 25.0);
}

#[test]
fn test_aggregate_drops_bad_rows_and_counts_them() {
    let data = TransactionData::from_orders(
        vec!["2023-01-05", "not a date", "2023-02-10"],
        vec![10.0, 20.0, 30.0],
    )
    .unwrap();

    let (series, stats) = QuarterlySeries::aggregate(&data).unwrap();

    assert_eq!(stats.total_rows, 3);
    assert_eq!(stats.dropped_rows, 1);
    assert_eq!(series.quantities(), vec![40.0]);
}

#[test]
fn test_aggregation_is_idempotent() {
    let data = TransactionData::from_orders(
        vec!["2022-03-14", "2022-05-01", "2022-09-09", "2022-11-30"],
        vec![100.0, 120.0, 90.0, 150.0],
    )
    .unwrap();
    let (first, _) = QuarterlySeries::aggregate(&data).unwrap();

    // Re-aggregating a one-row-per-quarter series must change nothing
    let dates: Vec<String> = first.points().iter().map(|p| p.date.to_string()).collect();
    let again = TransactionData::from_orders(
        dates.iter().map(String::as_str).collect(),
        first.quantities(),
    )
    .unwrap();
    let (second, _) = QuarterlySeries::aggregate(&again).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_outlier_filter_excludes_extreme_quarter() {
    // A single value 1000x the median only clears the z-threshold once the
    // series is long enough for the deviation to dominate the spread.
    let mut pairs: Vec<(NaiveDate, f64)> = Vec::new();
    let mut day = date("2020-01-01");
    for _ in 0..19 {
        pairs.push((day, 10.0));
        day = next_quarter_start(day);
    }
    pairs.push((day, 10_000.0));
    let series = QuarterlySeries::from_points(pairs);

    let (filtered, removed) =
        series.filter_outliers(DEFAULT_OUTLIER_Z_THRESHOLD, MIN_POINTS_FOR_FILTERING);

    assert_eq!(removed, 1);
    assert_eq!(filtered.len(), 19);
    assert!(filtered.quantities().iter().all(|&q| q == 10.0));
}

#[test]
fn test_outlier_filter_skips_short_series() {
    let pairs = vec![
        (date("2022-01-01"), 10.0),
        (date("2022-04-01"), 12.0),
        (date("2022-07-01"), 11.0),
        (date("2022-10-01"), 13.0),
        (date("2023-01-01"), 10_000.0),
    ];
    let series = QuarterlySeries::from_points(pairs);

    let (filtered, removed) =
        series.filter_outliers(DEFAULT_OUTLIER_Z_THRESHOLD, MIN_POINTS_FOR_FILTERING);

    // 5 points or fewer: too little data to estimate variance, keep all
    assert_eq!(removed, 0);
    assert_eq!(filtered.len(), 5);
}

#[test]
fn test_lagged_rows_from_nine_quarters() {
    let quantities = [100.0, 120.0, 90.0, 150.0, 200.0, 180.0, 210.0, 250.0, 300.0];
    let mut pairs = Vec::new();
    let mut day = date("2022-01-01");
    for &q in &quantities {
        pairs.push((day, q));
        day = next_quarter_start(day);
    }
    let series = QuarterlySeries::from_points(pairs);

    let rows = series.lagged_rows(DEFAULT_LAG);

    assert_eq!(rows.len(), 5);
    // Row for 2023-01-01 looks back at the four preceding quarters,
    // most recent first
    assert_eq!(rows[0].date, date("2023-01-01"));
    assert_eq!(rows[0].features, vec![150.0, 90.0, 120.0, 100.0]);
    assert_eq!(rows[0].quantity, 200.0);
    assert_eq!(rows[4].date, date("2024-01-01"));
    assert_eq!(rows[4].quantity, 300.0);
}

#[test]
fn test_lagged_rows_insufficient_history() {
    let pairs = vec![
        (date("2022-01-01"), 100.0),
        (date("2022-04-01"), 120.0),
        (date("2022-07-01"), 90.0),
        (date("2022-10-01"), 150.0),
    ];
    let series = QuarterlySeries::from_points(pairs);

    // Exactly lag-many quarters: no row has a label with full history
    assert!(series.lagged_rows(DEFAULT_LAG).is_empty());
}
