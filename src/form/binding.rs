use std::fmt::{Display, Formatter};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::fields::{FieldKey, FieldType};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FormError {
    StatePoisoned(&'static str),
    MissingInputFactory {
        field: FieldKey,
        field_type: FieldType,
    },
    MismatchedCell {
        field: FieldKey,
    },
    FieldUnreadable {
        field: FieldKey,
    },
}

impl Display for FormError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::StatePoisoned(context) => {
                write!(f, "form state lock poisoned while {context}")
            }
            FormError::MissingInputFactory { field, field_type } => {
                write!(
                    f,
                    "no input variant registered for field {field} of type {field_type:?}"
                )
            }
            FormError::MismatchedCell { field } => {
                write!(f, "field {field} is bound to a cell of the wrong type")
            }
            FormError::FieldUnreadable { field } => {
                write!(f, "Error in field: {field}. Data was not saved!")
            }
        }
    }
}

impl std::error::Error for FormError {}

pub type FormResult<T> = Result<T, FormError>;

pub(super) fn read_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockReadGuard<'a, T>> {
    lock.read().map_err(|_| FormError::StatePoisoned(context))
}

pub(super) fn write_lock<'a, T>(
    lock: &'a RwLock<T>,
    context: &'static str,
) -> FormResult<RwLockWriteGuard<'a, T>> {
    lock.write().map_err(|_| FormError::StatePoisoned(context))
}

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct BoundState<T> {
    value: T,
    listeners: Vec<Listener<T>>,
}

/// Observable mutable cell backing one form field. Writes notify every
/// subscriber synchronously, in registration order.
#[derive(Clone)]
pub struct BoundValue<T> {
    state: Arc<RwLock<BoundState<T>>>,
}

impl<T> BoundValue<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    pub fn new(initial: T) -> Self {
        Self {
            state: Arc::new(RwLock::new(BoundState {
                value: initial,
                listeners: Vec::new(),
            })),
        }
    }

    pub fn get(&self) -> FormResult<T> {
        Ok(read_lock(&self.state, "reading bound value")?.value.clone())
    }

    pub fn set(&self, value: T) -> FormResult<()> {
        let listeners = {
            let mut state = write_lock(&self.state, "writing bound value")?;
            state.value = value.clone();
            state.listeners.clone()
        };
        for listener in listeners {
            listener(&value);
        }
        Ok(())
    }

    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> FormResult<()> {
        let mut state = write_lock(&self.state, "registering bound value listener")?;
        state.listeners.push(Arc::new(listener));
        Ok(())
    }

    /// Clears the cell back to the type's empty value; listeners are notified
    /// like any other write.
    pub fn clear(&self) -> FormResult<()> {
        self.set(T::default())
    }
}

impl<T> Default for BoundValue<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Per-field validity message; an empty message means the field is valid.
#[derive(Clone, Default)]
pub struct ErrorState {
    message: Arc<RwLock<String>>,
}

impl ErrorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> FormResult<String> {
        Ok(read_lock(&self.message, "reading error state")?.clone())
    }

    pub fn set(&self, message: impl Into<String>) -> FormResult<()> {
        *write_lock(&self.message, "writing error state")? = message.into();
        Ok(())
    }

    pub fn clear(&self) -> FormResult<()> {
        write_lock(&self.message, "clearing error state")?.clear();
        Ok(())
    }

    pub fn is_empty(&self) -> FormResult<bool> {
        Ok(read_lock(&self.message, "reading error state")?.is_empty())
    }
}
