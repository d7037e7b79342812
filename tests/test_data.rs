use sales_forecast::data::{
    TransactionData, ORDER_DATE_COLUMN, QTY_COLUMN, TOTAL_VALUE_COLUMN, UNIT_PRICE_COLUMN,
    UNIT_TYPE_COLUMN,
};
use sales_forecast::error::ForecastError;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_from_csv() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "{},{},{},{},{}",
        ORDER_DATE_COLUMN, QTY_COLUMN, UNIT_PRICE_COLUMN, UNIT_TYPE_COLUMN, TOTAL_VALUE_COLUMN
    )
    .unwrap();
    writeln!(file, "2023-01-05,100,1000,pcs,100000").unwrap();
    writeln!(file, "2023-02-10,50,2000,stell,100000").unwrap();
    writeln!(file, "2023-04-01,25,4000,paket,100000").unwrap();

    let data = TransactionData::from_csv(file.path()).unwrap();

    assert_eq!(data.len(), 3);
    assert!(!data.is_empty());
    assert!(data
        .require_columns(&[ORDER_DATE_COLUMN, QTY_COLUMN])
        .is_ok());
}

#[test]
fn test_from_csv_missing_file() {
    let result = TransactionData::from_csv("nonexistent_file.csv");
    assert!(result.is_err());
}

#[test]
fn test_require_columns_reports_all_missing() {
    let data = TransactionData::from_orders(vec!["2023-01-01"], vec![10.0]).unwrap();

    let err = data
        .require_columns(&[ORDER_DATE_COLUMN, UNIT_PRICE_COLUMN, TOTAL_VALUE_COLUMN])
        .unwrap_err();

    match err {
        ForecastError::MissingColumns { missing } => {
            assert_eq!(missing, vec![UNIT_PRICE_COLUMN, TOTAL_VALUE_COLUMN]);
        }
        other => panic!("expected MissingColumns, got {:?}", other),
    }
}

#[test]
fn test_numeric_column_lenient_coercion() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{},{}", ORDER_DATE_COLUMN, QTY_COLUMN).unwrap();
    writeln!(file, "2023-01-05,100").unwrap();
    writeln!(file, "2023-02-10,abc").unwrap();
    writeln!(file, "2023-03-15,42.5").unwrap();

    let data = TransactionData::from_csv(file.path()).unwrap();
    let values = data.numeric_column(QTY_COLUMN).unwrap();

    assert_eq!(values, vec![Some(100.0), None, Some(42.5)]);
}

#[test]
fn test_date_column_drops_unparseable_cells() {
    let data = TransactionData::from_orders(
        vec!["2023-01-05", "not a date", "2023-07-20"],
        vec![1.0, 2.0, 3.0],
    )
    .unwrap();

    let dates = data.date_column(ORDER_DATE_COLUMN).unwrap();

    assert!(dates[0].is_some());
    assert!(dates[1].is_none());
    assert!(dates[2].is_some());
}

#[test]
fn test_date_column_accepts_multiple_formats() {
    let data = TransactionData::from_orders(
        vec!["2023-01-05", "2023/02/10", "15-03-2023", "2023-04-01 12:30:00"],
        vec![1.0; 4],
    )
    .unwrap();

    let dates = data.date_column(ORDER_DATE_COLUMN).unwrap();

    assert!(dates.iter().all(Option::is_some));
    assert_eq!(dates[3].unwrap().to_string(), "2023-04-01");
}
