mod binding;
mod composite;
mod input;
mod record;
mod validation;


pub use binding::{BoundValue, ErrorState, FormError, FormResult};
pub use composite::{InputRegistry, LabelInput, VarCell};
pub use input::{InputControl, TextArea, TextEntry, Toggle, Validity};
pub use record::{FieldValue, Record, RecordForm};
pub use validation::{
    DATE_FORMAT, DateText, EditAction, FreeText, InputPolicy, Keystroke, MSG_DATE_REQUIRED,
    MSG_INVALID_INPUT, MSG_VALUE_REQUIRED, RequiredText,
};
