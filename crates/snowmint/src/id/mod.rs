mod interface;
mod sid;
mod snowflake;

pub use interface::*;
pub use sid::*;
pub use snowflake::*;
