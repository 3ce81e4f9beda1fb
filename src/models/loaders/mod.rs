pub mod calculator_loader;
pub mod csv_loader;

pub use calculator_loader::{load_calculator_file, parse_calculator};
pub use csv_loader::{parse_csv, read_csv, validate_csv_path, CsvRow, CsvTable};
