//! Input adapters
//!
//! Everything that touches files lives here; the analysis and pipeline
//! layers only see in-memory `SampleTable`s and passports.

mod csv_table;
mod heat;
mod passport;

pub use csv_table::{detect_delimiter, load_table, parse_number, read_table, split_fields, INDEX_COLUMN};
pub use heat::heat_name;
pub use passport::{load_passport, parse_passport, Passport};
