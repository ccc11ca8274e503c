/// Database connectivity and schema management

pub mod migrations;
pub mod pool;
