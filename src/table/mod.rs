//! Reading consolidated data files back into per-size run tables.

pub mod discover;
pub mod parse;
pub mod run;

pub use discover::{discover_sizes, load_run_table};
pub use parse::{parse_data_file, parse_runs};
pub use run::{Run, RunTable, SizeGroup};
