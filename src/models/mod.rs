pub mod calculator;
pub mod loaders;
pub mod result;
pub mod sample;

pub use calculator::{Calculator, InputRule, NumericRange, ToggleRule, ValidationRule};
pub use loaders::{load_calculator_file, read_csv, validate_csv_path, CsvRow, CsvTable};
pub use result::{parse_score, ResultPair, ResultSet};
pub use sample::{Sample, ToggleValue};
