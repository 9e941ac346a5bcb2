use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{Days, Local, NaiveDate};
use rust_decimal::Decimal;

use crate::fields::{FieldKey, FieldSpec, FieldType, invoice_fields, keys};

use super::binding::{FormError, FormResult};
use super::composite::{InputRegistry, LabelInput, VarCell};
use super::validation::DATE_FORMAT;

/// Typed value of one field as read out of the form.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FieldValue {
    Text(String),
    Decimal(Decimal),
    Integer(i64),
    Boolean(bool),
    /// A blank numeric cell; serialized as an empty ledger column.
    Empty,
}

impl Display for FieldValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            // Amounts are entered and rendered with a decimal comma.
            FieldValue::Decimal(value) => f.write_str(&value.to_string().replace('.', ",")),
            FieldValue::Integer(value) => write!(f, "{value}"),
            FieldValue::Boolean(value) => write!(f, "{value}"),
            FieldValue::Empty => Ok(()),
        }
    }
}

/// Point-in-time snapshot of every field, keyed by field name.
pub type Record = BTreeMap<FieldKey, FieldValue>;

type SaveListener = Arc<dyn Fn() + Send + Sync>;

/// One composite per declared field, in declaration order, plus the outward
/// save signal. The form owns the bound cells; composites reference them.
pub struct RecordForm {
    specs: &'static [FieldSpec],
    vars: BTreeMap<FieldKey, VarCell>,
    inputs: BTreeMap<FieldKey, LabelInput>,
    save_listeners: Vec<SaveListener>,
    invoice_seed: u32,
}

impl RecordForm {
    pub fn new() -> FormResult<Self> {
        Self::with_registry(invoice_fields(), &InputRegistry::default())
    }

    /// Builds the form against an explicit input registry; a field type with
    /// no registered variant fails here, not at validation time.
    pub fn with_registry(
        specs: &'static [FieldSpec],
        registry: &InputRegistry,
    ) -> FormResult<Self> {
        let mut vars = BTreeMap::new();
        let mut inputs = BTreeMap::new();
        for spec in specs {
            let cell = VarCell::for_type(spec.field_type);
            let input = LabelInput::new(spec, &cell, registry)?;
            vars.insert(spec.key, cell);
            inputs.insert(spec.key, input);
        }
        let mut form = Self {
            specs,
            vars,
            inputs,
            save_listeners: Vec::new(),
            invoice_seed: 1,
        };
        form.reset()?;
        Ok(form)
    }

    pub fn specs(&self) -> &'static [FieldSpec] {
        self.specs
    }

    pub fn var(&self, key: FieldKey) -> Option<&VarCell> {
        self.vars.get(&key)
    }

    pub fn input(&self, key: FieldKey) -> Option<&LabelInput> {
        self.inputs.get(&key)
    }

    pub fn input_mut(&mut self, key: FieldKey) -> Option<&mut LabelInput> {
        self.inputs.get_mut(&key)
    }

    /// Writes a text field's cell directly, the way a frontend commits an
    /// edited value.
    pub fn set_text(&self, key: FieldKey, value: impl Into<String>) -> FormResult<()> {
        let cell = self
            .vars
            .get(&key)
            .ok_or(FormError::FieldUnreadable { field: key })?;
        cell.text()
            .ok_or(FormError::MismatchedCell { field: key })?
            .set(value.into())
    }

    pub fn text(&self, key: FieldKey) -> FormResult<String> {
        let cell = self
            .vars
            .get(&key)
            .ok_or(FormError::FieldUnreadable { field: key })?;
        cell.text()
            .ok_or(FormError::MismatchedCell { field: key })?
            .get()
    }

    /// Reads every cell into a record. A numeric cell holding content its
    /// semantic type cannot represent aborts the read; no partial record is
    /// returned.
    pub fn get(&self) -> FormResult<Record> {
        let mut record = Record::new();
        for spec in self.specs {
            let cell = self
                .vars
                .get(&spec.key)
                .ok_or(FormError::FieldUnreadable { field: spec.key })?;
            let value = match (spec.field_type, cell) {
                (FieldType::Boolean, VarCell::Flag(flag)) => FieldValue::Boolean(flag.get()?),
                (FieldType::Decimal, VarCell::Text(text)) => {
                    parse_decimal(spec.key, &text.get()?)?
                }
                (FieldType::Integer, VarCell::Text(text)) => {
                    parse_integer(spec.key, &text.get()?)?
                }
                (_, VarCell::Text(text)) => FieldValue::Text(text.get()?),
                _ => return Err(FormError::MismatchedCell { field: spec.key }),
            };
            record.insert(spec.key, value);
        }
        Ok(record)
    }

    /// Forces focus-loss validation on every composite and collects the
    /// fields whose error slot is non-empty afterwards.
    pub fn get_errors(&mut self) -> FormResult<BTreeMap<FieldKey, String>> {
        let mut errors = BTreeMap::new();
        for spec in self.specs {
            let input = self
                .inputs
                .get_mut(&spec.key)
                .ok_or(FormError::FieldUnreadable { field: spec.key })?;
            input.trigger_focusout_validation()?;
            let message = input.error_message()?;
            if !message.is_empty() {
                errors.insert(spec.key, message);
            }
        }
        Ok(errors)
    }

    /// Clears every cell, then re-applies the fixed defaults: today as the
    /// issue date, today + 14 days as the due date, and the zero-padded
    /// invoice-number seed.
    pub fn reset(&mut self) -> FormResult<()> {
        self.reset_as_of(Local::now().date_naive())
    }

    /// Deterministic variant of [`reset`](Self::reset) for a caller-supplied
    /// "today".
    pub fn reset_as_of(&mut self, today: NaiveDate) -> FormResult<()> {
        for spec in self.specs {
            if let Some(cell) = self.vars.get(&spec.key) {
                cell.clear()?;
            }
            if let Some(input) = self.inputs.get_mut(&spec.key) {
                input.reset()?;
            }
        }
        let due = today + Days::new(14);
        self.seed_text(keys::DATUM_IZDAJE, today.format(DATE_FORMAT).to_string())?;
        self.seed_text(keys::DATUM_ZAPADLOSTI, due.format(DATE_FORMAT).to_string())?;
        self.seed_text(keys::ST_RACUNA, format!("{:03}", self.invoice_seed))?;
        Ok(())
    }

    // A default only applies when the spec table declares the field.
    fn seed_text(&self, key: FieldKey, value: String) -> FormResult<()> {
        if self.vars.contains_key(&key) {
            self.set_text(key, value)?;
        }
        Ok(())
    }

    pub fn invoice_seed(&self) -> u32 {
        self.invoice_seed
    }

    /// Sets the sequence the next reset seeds the invoice-number field with.
    pub fn set_invoice_seed(&mut self, seed: u32) {
        self.invoice_seed = seed;
    }

    pub fn on_save(&mut self, listener: impl Fn() + Send + Sync + 'static) {
        self.save_listeners.push(Arc::new(listener));
    }

    /// Emits the payload-less save signal; receivers read the form themselves.
    pub fn save(&self) {
        for listener in &self.save_listeners {
            listener();
        }
    }
}

fn parse_decimal(field: FieldKey, content: &str) -> FormResult<FieldValue> {
    let content = content.trim();
    if content.is_empty() {
        return Ok(FieldValue::Empty);
    }
    Decimal::from_str(&content.replace(',', "."))
        .map(FieldValue::Decimal)
        .map_err(|_| FormError::FieldUnreadable { field })
}

fn parse_integer(field: FieldKey, content: &str) -> FormResult<FieldValue> {
    let content = content.trim();
    if content.is_empty() {
        return Ok(FieldValue::Empty);
    }
    content
        .parse::<i64>()
        .map(FieldValue::Integer)
        .map_err(|_| FormError::FieldUnreadable { field })
}
