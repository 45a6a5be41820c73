pub mod snapshot;
pub mod tax_rate;
