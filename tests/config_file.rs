//! The shipped example configuration stays loadable.

use event_datagen::{build_jobs, DatagenConfig, HistoryGenerator};
use rand::rngs::StdRng;
use rand::SeedableRng;

const EXAMPLE_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/datagen.example.toml");

#[test]
fn test_example_config_is_valid() {
    let config = DatagenConfig::from_file(EXAMPLE_PATH).unwrap();
    config.validate().unwrap();

    assert_eq!(config.seed, Some(42));
    assert!(config.history.enabled);
    assert_eq!(config.reviews.products_with_size_issue_count, 3);
    assert_eq!(build_jobs(&config).unwrap().len(), 13);
    assert_eq!(config.online_orders.out_of_stock_probability, 0.1);
    assert_eq!(config.order_patterns.large_quantity_min, 20);

    let history = HistoryGenerator::from_config(&config, StdRng::seed_from_u64(1)).unwrap();
    assert_eq!(history.window(), chrono::Duration::days(1));
}

#[test]
fn test_missing_file_names_path() {
    let err = DatagenConfig::from_file("/nonexistent/datagen.toml").unwrap_err();
    assert!(err.to_string().contains("/nonexistent/datagen.toml"));
}
