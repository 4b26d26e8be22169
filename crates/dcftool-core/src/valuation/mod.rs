pub mod dcf;
pub mod forecast;
pub mod wacc;
