mod export;
mod table;

pub use export::export_json;
pub use table::{DEFAULT_ATTRIBUTE_COLUMNS, render_report, render_table};
