use std::fmt::{Display, Formatter};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Days, NaiveDate};

use crate::fields::{FieldKey, keys};
use crate::form::{FieldValue, Record};
use crate::profile::IssuerProfile;

/// Lines of invoice body per rendered page, banner and footer excluded.
const PAGE_BODY_LINES: usize = 66;

#[derive(Debug)]
pub enum DocumentError {
    Io { path: PathBuf, source: std::io::Error },
    MissingField { field: FieldKey },
}

impl Display for DocumentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentError::Io { path, source } => {
                write!(f, "failed writing invoice {}: {source}", path.display())
            }
            DocumentError::MissingField { field } => {
                write!(f, "record is missing the field {field}")
            }
        }
    }
}

impl std::error::Error for DocumentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentError::Io { source, .. } => Some(source),
            DocumentError::MissingField { .. } => None,
        }
    }
}

/// Invoice number: issuer initials, two-digit year, dash, zero-padded
/// three-digit code. `JN25-001` for Janez Novak's first invoice of 2025.
pub fn invoice_number(profile: &IssuerProfile, code: &str, today: NaiveDate) -> String {
    format!(
        "{}{:02}-{code:0>3}",
        profile.initials(),
        today.year() % 100
    )
}

/// The payment reference (sklic) is the invoice number without the initials,
/// however many letters the issuer's name yields.
pub fn payment_reference(number: &str) -> &str {
    let boundary = number
        .char_indices()
        .find(|(_, ch)| ch.is_ascii_digit())
        .map(|(index, _)| index)
        .unwrap_or(number.len());
    &number[boundary..]
}

/// A composed invoice: the derived number plus the fixed-width body, ready to
/// be paginated and written out.
pub struct InvoiceDocument {
    number: String,
    body: String,
}

impl InvoiceDocument {
    /// Lays out the invoice from a record snapshot and the issuer profile.
    /// Issue and due dates are derived from `today`, matching the form's
    /// reset defaults.
    pub fn compose(
        record: &Record,
        profile: &IssuerProfile,
        today: NaiveDate,
    ) -> Result<Self, DocumentError> {
        let code = text_field(record, keys::ST_RACUNA)?;
        let number = invoice_number(profile, &code, today);
        let reference = payment_reference(&number).to_string();

        let naziv = text_field(record, keys::NAZIV)?;
        let naslov = text_field(record, keys::NASLOV)?;
        let davcna = text_field(record, keys::DAVCNA_STEVILKA)?;
        let maticna = display_field(record, keys::MATICNA_STEVILKA)?;
        let opis = text_field(record, keys::OPIS_STORITVE)?;
        let datum_storitve = text_field(record, keys::DATUM_STORITVE)?;
        let znesek = display_field(record, keys::ZNESEK)?;

        let datum_izdaje = today.format("%d.%m.%Y").to_string();
        let datum_zapadlosti = (today + Days::new(14)).format("%d.%m.%Y").to_string();

        // Recipient address prints on two lines when it carries a comma.
        let (ulica_p, kraj_p) = match naslov.split_once(", ") {
            Some((street, place)) => (street.to_string(), place.to_string()),
            None => (naslov.clone(), String::new()),
        };

        let naziv_i = pad(&profile.name, 68);
        let ulica_i = pad(&profile.street, 67);
        let kraj_i = pad(&format!("{} {}", profile.post_nr, profile.city), 76);
        let ds_i = pad(&profile.tax_nr, 54);

        let opis_col = pad(&opis, 41);
        let znesek_cell = pad(&format!("{znesek}€"), 10);
        let znesek_total = pad(&format!("{znesek}€"), 15);
        let znesek_sum = pad(&format!("{znesek}€"), 18);
        let blank_sum = pad("0,00€", 18);

        let mut body = String::new();
        let _ = writeln!(body, "Izdajatelj:{}Prejemnik:", " ".repeat(53));
        let _ = writeln!(body, "{naziv_i}Naziv:  {naziv}");
        let _ = writeln!(body, "{ulica_i}Naslov:  {ulica_p}");
        let _ = writeln!(body, "{kraj_i}{kraj_p}");
        let _ = writeln!(body, "{}DŠ:  {davcna}", " ".repeat(71));
        let _ = writeln!(body, "DAVČNA ŠTEVILKA: {ds_i}MŠ:  {maticna}");
        body.push('\n');
        let _ = writeln!(body, "IBAN:   {}", profile.iban);
        let _ = writeln!(body, "Banka:  {}", profile.bank);
        let _ = writeln!(body, "BIC:    {}", profile.bic);
        body.push_str("\n\n");
        let _ = writeln!(body, "Račun št. {number}");
        body.push('\n');
        let _ = writeln!(body, "{}Datum izdaje:  {datum_izdaje}", " ".repeat(61));
        let _ = writeln!(body, "{}Način plačila:  Nakazilo na TRR", " ".repeat(60));
        let _ = writeln!(body, "{}Valuta:  EUR", " ".repeat(67));
        let _ = writeln!(body, "{}Kraj izdaje:  {}", " ".repeat(62), profile.place);
        let _ = writeln!(
            body,
            "{}Datum opravljene storitve:  {datum_storitve}",
            " ".repeat(48)
        );
        let _ = writeln!(body, "{}Datum zapadlosti:  {datum_zapadlosti}", " ".repeat(57));
        let _ = writeln!(body, "{}Sklic:  {reference}", " ".repeat(68));
        let _ = writeln!(body, "{}Koda namena:  OTHR", " ".repeat(62));
        body.push('\n');
        let _ = writeln!(body, "{}", "_".repeat(107));
        body.push_str(
            "Na osnovi pogodbe/naročila vam zaračunavam avtorsko delo iz neodvisnega \
             samostojnega opravljanja\ndejavnosti po 46. členu Zdoh-2L.\n",
        );
        let _ = writeln!(body, "{}", "_".repeat(107));
        body.push('\n');

        let rule = format!(
            "+{}+{}+{}+{}+{}+{}+{}+",
            "-".repeat(42),
            "-".repeat(10),
            "-".repeat(5),
            "-".repeat(11),
            "-".repeat(10),
            "-".repeat(5),
            "-".repeat(16)
        );
        let double_rule = rule.replace('-', "=");
        let _ = writeln!(body, "{rule}");
        let _ = writeln!(
            body,
            "| Opis storitve{}| Količina | EM  | Cena/EM   | Popust   | DDV | Vrednost z DDV |",
            " ".repeat(28)
        );
        let _ = writeln!(body, "{double_rule}");
        let _ = writeln!(
            body,
            "| {opis_col}|    1     | PCE | {znesek_cell}| 0% 0,00€ | 0%  | {znesek_total}|"
        );
        let _ = writeln!(body, "{rule}");
        body.push('\n');
        body.push_str("DDV po 1. odstavku 94. člena ZDDV-1 ni obračunan.\n\n");

        let margin = " ".repeat(64);
        let totals_rule = format!("{margin}+{}+{}+", "-".repeat(21), "-".repeat(19));
        let _ = writeln!(body, "{totals_rule}");
        let _ = writeln!(body, "{margin}| Vrednost postavk:   | {znesek_sum}|");
        let _ = writeln!(body, "{totals_rule}");
        let _ = writeln!(body, "{margin}| Vsota popustov:     | {blank_sum}|");
        let _ = writeln!(body, "{totals_rule}");
        let _ = writeln!(body, "{margin}| Osnova za DDV:      | {blank_sum}|");
        let _ = writeln!(body, "{totals_rule}");
        let _ = writeln!(body, "{margin}| Neobdavčeno:        | {znesek_sum}|");
        let _ = writeln!(body, "{totals_rule}");
        let _ = writeln!(body, "{margin}| Vsota zneskov:      | {}|", pad("DDV: 0,00€", 18));
        let _ = writeln!(body, "{totals_rule}");
        let _ = writeln!(body, "{margin}| ZA PLAČILO:         | {znesek_sum}|");
        let _ = writeln!(body, "{totals_rule}");
        body.push_str("\n\n    Podpis:\n\n");
        let _ = writeln!(body, "{}", "_".repeat(107));

        Ok(Self { number, body })
    }

    pub fn number(&self) -> &str {
        &self.number
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Splits the body into pages, each topped with the number banner and
    /// closed with a centered "Page x/y" footer.
    pub fn pages(&self) -> Vec<String> {
        let lines: Vec<&str> = self.body.lines().collect();
        let chunks: Vec<&[&str]> = if lines.is_empty() {
            vec![&[]]
        } else {
            lines.chunks(PAGE_BODY_LINES).collect()
        };
        let total = chunks.len();
        chunks
            .iter()
            .enumerate()
            .map(|(page_index, chunk)| {
                let mut page = String::new();
                let banner = format!("Račun št. {}", self.number);
                let width = banner.chars().count() + 36;
                let _ = writeln!(page, "+{}+", "-".repeat(width));
                let _ = writeln!(page, "|{}|", center(&banner, width));
                let _ = writeln!(page, "+{}+", "-".repeat(width));
                page.push('\n');
                for line in *chunk {
                    page.push_str(line);
                    page.push('\n');
                }
                page.push('\n');
                let footer = format!("Page {}/{total}", page_index + 1);
                let _ = writeln!(page, "{}", center(&footer, 107));
                page
            })
            .collect()
    }

    pub fn file_name(&self) -> String {
        format!("racun_st.{}.txt", self.number)
    }

    /// Writes the paginated document under `dir`, pages separated by a form
    /// feed. Returns the written path.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, DocumentError> {
        let path = dir.as_ref().join(self.file_name());
        let content = self.pages().join("\u{c}\n");
        std::fs::write(&path, content).map_err(|source| DocumentError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %path.display(), "wrote invoice document");
        Ok(path)
    }
}

fn text_field(record: &Record, key: FieldKey) -> Result<String, DocumentError> {
    match record.get(&key) {
        Some(FieldValue::Text(text)) => Ok(text.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(DocumentError::MissingField { field: key }),
    }
}

fn display_field(record: &Record, key: FieldKey) -> Result<String, DocumentError> {
    record
        .get(&key)
        .map(ToString::to_string)
        .ok_or(DocumentError::MissingField { field: key })
}

fn pad(content: &str, width: usize) -> String {
    let length = content.chars().count();
    let mut padded = content.to_string();
    padded.extend(std::iter::repeat_n(' ', width.saturating_sub(length)));
    padded
}

fn center(content: &str, width: usize) -> String {
    let length = content.chars().count();
    if length >= width {
        return content.to_string();
    }
    let left = (width - length) / 2;
    let right = width - length - left;
    format!("{}{content}{}", " ".repeat(left), " ".repeat(right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::invoice_fields;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn profile() -> IssuerProfile {
        IssuerProfile::embedded_default().expect("embedded profile")
    }

    fn sample_record() -> Record {
        let mut record = Record::new();
        for spec in invoice_fields() {
            record.insert(spec.key, FieldValue::Text(String::new()));
        }
        record.insert(keys::ST_RACUNA, FieldValue::Text("001".into()));
        record.insert(keys::NAZIV, FieldValue::Text("Podjetje d.o.o.".into()));
        record.insert(
            keys::NASLOV,
            FieldValue::Text("Slovenska cesta 1, 1000 Ljubljana".into()),
        );
        record.insert(keys::DAVCNA_STEVILKA, FieldValue::Text("12345678".into()));
        record.insert(keys::MATICNA_STEVILKA, FieldValue::Integer(9876543));
        record.insert(keys::OPIS_STORITVE, FieldValue::Text("Lektoriranje".into()));
        record.insert(keys::DATUM_STORITVE, FieldValue::Text("01.03.2025".into()));
        record.insert(
            keys::ZNESEK,
            FieldValue::Decimal(Decimal::from_str("250.00").expect("decimal")),
        );
        record
    }

    fn march_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).expect("valid date")
    }

    #[test]
    fn invoice_number_combines_initials_year_and_code() {
        assert_eq!(invoice_number(&profile(), "001", march_first()), "JN25-001");
        assert_eq!(invoice_number(&profile(), "42", march_first()), "JN25-042");
    }

    #[test]
    fn payment_reference_drops_the_initials() {
        assert_eq!(payment_reference("JN25-001"), "25-001");
    }

    #[test]
    fn payment_reference_handles_single_initial_issuers() {
        let mut issuer = profile();
        issuer.name = "Mojca".to_string();
        let number = invoice_number(&issuer, "001", march_first());
        assert_eq!(number, "M25-001");
        assert_eq!(payment_reference(&number), "25-001");
    }

    #[test]
    fn composed_body_carries_the_record_fields() {
        let document = InvoiceDocument::compose(&sample_record(), &profile(), march_first())
            .expect("compose invoice");
        assert_eq!(document.number(), "JN25-001");
        assert!(document.body().contains("Naziv:  Podjetje d.o.o."));
        assert!(document.body().contains("Naslov:  Slovenska cesta 1"));
        assert!(document.body().contains("1000 Ljubljana"));
        assert!(document.body().contains("Sklic:  25-001"));
        assert!(document.body().contains("250,00€"));
        assert!(document.body().contains("Datum zapadlosti:  15.03.2025"));
    }

    #[test]
    fn missing_field_aborts_composition() {
        let mut record = sample_record();
        record.remove(&keys::NAZIV);
        let result = InvoiceDocument::compose(&record, &profile(), march_first());
        assert!(matches!(
            result,
            Err(DocumentError::MissingField { field }) if field == keys::NAZIV
        ));
    }

    #[test]
    fn every_page_has_a_banner_and_a_footer() {
        let document = InvoiceDocument::compose(&sample_record(), &profile(), march_first())
            .expect("compose invoice");
        let pages = document.pages();
        assert!(!pages.is_empty());
        let total = pages.len();
        for (index, page) in pages.iter().enumerate() {
            assert!(page.contains("Račun št. JN25-001"));
            assert!(page.contains(&format!("Page {}/{total}", index + 1)));
        }
    }

    #[test]
    fn file_name_is_derived_from_the_number() {
        let mut record = sample_record();
        record.insert(keys::ST_RACUNA, FieldValue::Text("3".into()));
        let document = InvoiceDocument::compose(&record, &profile(), march_first())
            .expect("compose invoice");
        assert_eq!(document.file_name(), "racun_st.JN25-003.txt");
    }

    #[test]
    fn write_to_creates_the_document_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let document = InvoiceDocument::compose(&sample_record(), &profile(), march_first())
            .expect("compose invoice");
        let path = document.write_to(dir.path()).expect("write document");
        let content = std::fs::read_to_string(&path).expect("read document back");
        assert!(content.contains("Račun št. JN25-001"));
        assert!(content.contains("ZA PLAČILO:"));
    }
}
