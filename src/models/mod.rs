pub mod charge_mode;

pub use charge_mode::ChargeMode;
