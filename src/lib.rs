pub mod application;
pub mod document;
pub mod fields;
pub mod form;
pub mod ledger;
pub mod profile;

pub use application::{AppError, Application};
pub use form::{Record, RecordForm};
