pub mod charset;
pub mod datatype;
pub mod delimiter;

pub use charset::{decode_to_utf8, detect_charset};
pub use datatype::{build_column_data, detect_data_type, is_missing_marker, parse_number};
pub use delimiter::detect_delimiter;
