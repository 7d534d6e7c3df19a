pub mod formatter;
pub mod printer;

pub use formatter::{format_currency, format_flow_value, format_number, format_percentage};
