use std::collections::BTreeMap;
use std::sync::Arc;

use crate::fields::{FieldSpec, FieldType};

use super::binding::{BoundValue, ErrorState, FormError, FormResult};
use super::input::{InputControl, TextArea, TextEntry, Toggle};
use super::validation::{DateText, FreeText, InputPolicy, RequiredText};

/// The cell a field binds to; boolean fields carry a flag cell, everything
/// else edits text.
#[derive(Clone)]
pub enum VarCell {
    Text(BoundValue<String>),
    Flag(BoundValue<bool>),
}

impl VarCell {
    pub fn for_type(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Boolean => VarCell::Flag(BoundValue::default()),
            _ => VarCell::Text(BoundValue::default()),
        }
    }

    pub fn text(&self) -> Option<&BoundValue<String>> {
        match self {
            VarCell::Text(cell) => Some(cell),
            VarCell::Flag(_) => None,
        }
    }

    pub fn flag(&self) -> Option<&BoundValue<bool>> {
        match self {
            VarCell::Flag(cell) => Some(cell),
            VarCell::Text(_) => None,
        }
    }

    pub fn clear(&self) -> FormResult<()> {
        match self {
            VarCell::Text(cell) => cell.clear(),
            VarCell::Flag(cell) => cell.clear(),
        }
    }
}

type InputFactory =
    Arc<dyn Fn(&FieldSpec, &VarCell, ErrorState) -> FormResult<InputControl> + Send + Sync>;

/// Explicit field-type → input-constructor table, resolved once per composite
/// at form construction. A missing entry is a configuration error, never a
/// validation-time fallback.
pub struct InputRegistry {
    factories: BTreeMap<FieldType, InputFactory>,
}

impl InputRegistry {
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    pub fn register(
        &mut self,
        field_type: FieldType,
        factory: impl Fn(&FieldSpec, &VarCell, ErrorState) -> FormResult<InputControl>
        + Send
        + Sync
        + 'static,
    ) {
        self.factories.insert(field_type, Arc::new(factory));
    }

    pub(super) fn build(
        &self,
        spec: &FieldSpec,
        cell: &VarCell,
        error: ErrorState,
    ) -> FormResult<InputControl> {
        let factory =
            self.factories
                .get(&spec.field_type)
                .ok_or(FormError::MissingInputFactory {
                    field: spec.key,
                    field_type: spec.field_type,
                })?;
        factory(spec, cell, error)
    }
}

fn text_cell(spec: &FieldSpec, cell: &VarCell) -> FormResult<BoundValue<String>> {
    cell.text()
        .cloned()
        .ok_or(FormError::MismatchedCell { field: spec.key })
}

fn flag_cell(spec: &FieldSpec, cell: &VarCell) -> FormResult<BoundValue<bool>> {
    cell.flag()
        .cloned()
        .ok_or(FormError::MismatchedCell { field: spec.key })
}

fn required_entry(spec: &FieldSpec, cell: &VarCell, error: ErrorState) -> FormResult<InputControl> {
    let policy: Box<dyn InputPolicy> = if spec.required {
        Box::new(RequiredText)
    } else {
        Box::new(FreeText)
    };
    Ok(InputControl::Entry(TextEntry::new(
        text_cell(spec, cell)?,
        error,
        policy,
    )))
}

fn date_entry(spec: &FieldSpec, cell: &VarCell, error: ErrorState) -> FormResult<InputControl> {
    Ok(InputControl::Entry(TextEntry::new(
        text_cell(spec, cell)?,
        error,
        Box::new(DateText),
    )))
}

fn long_text_area(spec: &FieldSpec, cell: &VarCell, error: ErrorState) -> FormResult<InputControl> {
    Ok(InputControl::Area(TextArea::new(
        text_cell(spec, cell)?,
        error,
    )?))
}

fn boolean_toggle(spec: &FieldSpec, cell: &VarCell, error: ErrorState) -> FormResult<InputControl> {
    Ok(InputControl::Toggle(Toggle::new(
        flag_cell(spec, cell)?,
        error,
    )))
}

impl Default for InputRegistry {
    /// The stock selection table: short text, decimals and integers share the
    /// required-text entry; dates get the masked date entry; long text gets
    /// the free-form area; booleans get the toggle.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(FieldType::ShortText, required_entry);
        registry.register(FieldType::Decimal, required_entry);
        registry.register(FieldType::Integer, required_entry);
        registry.register(FieldType::DateText, date_entry);
        registry.register(FieldType::LongText, long_text_area);
        registry.register(FieldType::Boolean, boolean_toggle);
        registry
    }
}

/// Caption, input variant and error slot for one field.
pub struct LabelInput {
    label: String,
    input: InputControl,
    error: ErrorState,
}

impl LabelInput {
    pub fn new(spec: &FieldSpec, cell: &VarCell, registry: &InputRegistry) -> FormResult<Self> {
        let error = ErrorState::new();
        let input = registry.build(spec, cell, error.clone())?;
        Ok(Self {
            label: spec.key.as_str().to_string(),
            input,
            error,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn error_message(&self) -> FormResult<String> {
        self.error.get()
    }

    pub fn input(&self) -> &InputControl {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputControl {
        &mut self.input
    }

    pub fn trigger_focusout_validation(&mut self) -> FormResult<bool> {
        self.input.trigger_focusout_validation()
    }

    pub(super) fn reset(&mut self) -> FormResult<()> {
        self.input.reset_validity()
    }
}
