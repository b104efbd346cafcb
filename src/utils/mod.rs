pub mod constants;
pub mod url_utils;
