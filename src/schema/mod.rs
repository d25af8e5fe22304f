mod manager;
mod statements;

pub use manager::{InsertAck, SchemaManager, TableSetupResult};
pub use statements::{check_identifier, is_valid_identifier, output_name};
