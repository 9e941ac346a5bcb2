use std::fmt::{Display, Formatter};

/// Interned name of one form field, doubling as the ledger column name.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// Semantic type of a field, used to select the input variant and the
/// conversion applied when a record is read.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum FieldType {
    ShortText,
    DateText,
    LongText,
    Decimal,
    Integer,
    Boolean,
}

#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    pub key: FieldKey,
    pub required: bool,
    pub field_type: FieldType,
}

impl FieldSpec {
    pub const fn new(key: &'static str, required: bool, field_type: FieldType) -> Self {
        Self {
            key: FieldKey::new(key),
            required,
            field_type,
        }
    }
}

pub mod keys {
    use super::FieldKey;

    pub const ST_RACUNA: FieldKey = FieldKey::new("Št. računa");
    pub const NAZIV: FieldKey = FieldKey::new("Naziv");
    pub const NASLOV: FieldKey = FieldKey::new("Naslov");
    pub const DAVCNA_STEVILKA: FieldKey = FieldKey::new("Davčna številka");
    pub const MATICNA_STEVILKA: FieldKey = FieldKey::new("Matična številka");
    pub const OPIS_STORITVE: FieldKey = FieldKey::new("Opis storitve");
    pub const DATUM_IZDAJE: FieldKey = FieldKey::new("Datum izdaje");
    pub const DATUM_STORITVE: FieldKey = FieldKey::new("Datum opravljene storitve");
    pub const DATUM_ZAPADLOSTI: FieldKey = FieldKey::new("Datum zapadlosti");
    pub const ZNESEK: FieldKey = FieldKey::new("Znesek");
    pub const OPOMBA: FieldKey = FieldKey::new("Opomba");
}

/// The invoice field table, in ledger column order.
pub const INVOICE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("Št. računa", true, FieldType::ShortText),
    FieldSpec::new("Naziv", true, FieldType::ShortText),
    FieldSpec::new("Naslov", true, FieldType::ShortText),
    FieldSpec::new("Davčna številka", true, FieldType::ShortText),
    FieldSpec::new("Matična številka", false, FieldType::Integer),
    FieldSpec::new("Opis storitve", true, FieldType::ShortText),
    FieldSpec::new("Datum izdaje", true, FieldType::DateText),
    FieldSpec::new("Datum opravljene storitve", true, FieldType::DateText),
    FieldSpec::new("Datum zapadlosti", true, FieldType::DateText),
    FieldSpec::new("Znesek", true, FieldType::Decimal),
    FieldSpec::new("Opomba", false, FieldType::LongText),
];

pub fn invoice_fields() -> &'static [FieldSpec] {
    INVOICE_FIELDS
}
