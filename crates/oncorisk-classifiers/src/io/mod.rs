pub mod risk_csv;

pub use risk_csv::{load_dataset, load_dataset_with_config, read_dataset, LoaderConfig};
