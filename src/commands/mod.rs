pub mod bridge;
#[cfg(feature = "desktop")]
pub mod file_commands;

pub use bridge::Bridge;
