pub mod forecast;
pub mod seed;
pub mod session;
pub mod valuation;
pub mod wacc;
