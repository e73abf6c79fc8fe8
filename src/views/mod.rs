pub mod homepage;
pub mod layout;
pub mod quiz;

pub use layout::{page, render, titled};
