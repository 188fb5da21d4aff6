pub mod ip;
pub mod snowflake;

pub use snowflake::SnowflakeIdGenerator;
