//! Data model for records flowing into the encoder.
#![deny(warnings)]
#![deny(missing_docs)]

mod error;
pub use self::error::RecordError;

mod record;
pub use self::record::{Field, Record};

pub mod time;

mod value;
pub use self::value::FieldValue;
