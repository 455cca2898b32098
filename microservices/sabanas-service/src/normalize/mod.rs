//! Field-level normalization shared by every carrier parser (C1).

pub mod azimuth;
pub mod coords;
pub mod datetime;
pub mod duration;
pub mod imei;
pub mod msisdn;

pub use azimuth::{parse_azimuth, pick_last_nonzero};
pub use coords::parse_coordinate;
pub use datetime::{
    expand_two_digit_year, parse_movistar_datetime, parse_telcel_datetime, parse_with_formats,
    zero_pad_hour, GENERIC_DATETIME_FORMATS,
};
pub use duration::parse_duration_seconds;
pub use imei::clean_imei;
pub use msisdn::{clean_msisdn, extract_msisdn_from_filename};
