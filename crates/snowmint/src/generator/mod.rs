mod snowflake;
#[cfg(test)]
mod tests;
mod wait;

pub use snowflake::*;
pub use wait::*;
