// Data module
// Records, personas, dataset loading and the eligibility-filtered record source

mod dataset;
mod persona;
mod source;

pub use dataset::{load_records, read_records, Record};
pub use persona::{Persona, PERSONAS};
pub use source::{is_eligible, max_count_from_sentinel, RecordSource};
