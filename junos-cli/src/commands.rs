pub mod builtin;
pub mod command;
pub mod lock;
pub mod rescue;
pub mod rollback;
