pub mod app_error;
pub mod billing_calculator;
pub mod ports;
pub mod use_cases;
