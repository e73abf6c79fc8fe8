pub mod quiz;
pub mod round;
pub mod session;
