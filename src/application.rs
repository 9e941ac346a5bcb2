use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;

use crate::document::{DocumentError, InvoiceDocument};
use crate::form::{FormError, RecordForm};
use crate::ledger::{CsvLedger, LedgerError};
use crate::profile::{IssuerProfile, ProfileError};

#[derive(Debug)]
pub enum AppError {
    Form(FormError),
    Ledger(LedgerError),
    Document(DocumentError),
    Profile(ProfileError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Form(source) => source.fmt(f),
            AppError::Ledger(source) => source.fmt(f),
            AppError::Document(source) => source.fmt(f),
            AppError::Profile(source) => source.fmt(f),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Form(source) => Some(source),
            AppError::Ledger(source) => Some(source),
            AppError::Document(source) => Some(source),
            AppError::Profile(source) => Some(source),
        }
    }
}

impl From<FormError> for AppError {
    fn from(source: FormError) -> Self {
        AppError::Form(source)
    }
}

impl From<LedgerError> for AppError {
    fn from(source: LedgerError) -> Self {
        AppError::Ledger(source)
    }
}

impl From<DocumentError> for AppError {
    fn from(source: DocumentError) -> Self {
        AppError::Document(source)
    }
}

impl From<ProfileError> for AppError {
    fn from(source: ProfileError) -> Self {
        AppError::Profile(source)
    }
}

/// Wires the record form to the ledger and the document renderer. The form's
/// submit signal only raises a flag; `pump` performs the actual save so the
/// frontend's event dispatch stays free of IO.
pub struct Application {
    form: RecordForm,
    ledger: CsvLedger,
    profile: IssuerProfile,
    out_dir: PathBuf,
    records_saved: u32,
    status: String,
    save_requested: Arc<AtomicBool>,
}

impl Application {
    pub fn new(out_dir: impl AsRef<Path>) -> Result<Self, AppError> {
        Self::with_profile(out_dir, IssuerProfile::embedded_default()?)
    }

    pub fn with_profile(
        out_dir: impl AsRef<Path>,
        profile: IssuerProfile,
    ) -> Result<Self, AppError> {
        let out_dir = out_dir.as_ref().to_path_buf();
        let ledger = CsvLedger::new(&out_dir)?;
        let mut form = RecordForm::new()?;
        let save_requested = Arc::new(AtomicBool::new(false));
        let flag = save_requested.clone();
        form.on_save(move || flag.store(true, Ordering::SeqCst));
        Ok(Self {
            form,
            ledger,
            profile,
            out_dir,
            records_saved: 0,
            status: String::new(),
            save_requested,
        })
    }

    pub fn form(&self) -> &RecordForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut RecordForm {
        &mut self.form
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn records_saved(&self) -> u32 {
        self.records_saved
    }

    /// Processes a pending submit, if any. A failed save surfaces through the
    /// status line and the returned error, and leaves the form un-reset.
    pub fn pump(&mut self) -> Result<(), AppError> {
        if !self.save_requested.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        match self.handle_save() {
            Ok(()) => Ok(()),
            Err(error) => {
                self.status = error.to_string();
                tracing::error!(%error, "invoice save failed");
                Err(error)
            }
        }
    }

    fn handle_save(&mut self) -> Result<(), AppError> {
        let errors = self.form.get_errors()?;
        if !errors.is_empty() {
            for (field, message) in &errors {
                tracing::warn!(%field, %message, "field failed validation at save");
            }
        }
        let record = self.form.get()?;
        self.ledger.save_record(&record)?;
        self.records_saved += 1;
        self.status = format!("Shranjenih je bilo {} računov.", self.records_saved);

        let today = Local::now().date_naive();
        let document = InvoiceDocument::compose(&record, &self.profile, today)?;
        document.write_to(&self.out_dir)?;

        self.form.set_invoice_seed(self.form.invoice_seed() + 1);
        self.form.reset()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::keys;
    use chrono::Datelike;

    fn fill_required_fields(app: &mut Application) {
        let form = app.form();
        form.set_text(keys::NAZIV, "Podjetje d.o.o.").expect("set naziv");
        form.set_text(keys::NASLOV, "Slovenska cesta 1, 1000 Ljubljana")
            .expect("set naslov");
        form.set_text(keys::DAVCNA_STEVILKA, "12345678")
            .expect("set davčna");
        form.set_text(keys::OPIS_STORITVE, "Lektoriranje")
            .expect("set opis");
        form.set_text(keys::DATUM_STORITVE, "01.03.2025")
            .expect("set datum storitve");
        form.set_text(keys::ZNESEK, "250,00").expect("set znesek");
    }

    #[test]
    fn pump_without_a_pending_save_is_a_no_op() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut app = Application::new(dir.path()).expect("construct application");
        app.pump().expect("pump");
        assert_eq!(app.records_saved(), 0);
        assert!(app.status().is_empty());
    }

    #[test]
    fn submit_appends_a_row_writes_a_document_and_resets_the_form() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut app = Application::new(dir.path()).expect("construct application");
        fill_required_fields(&mut app);

        app.form().save();
        app.pump().expect("pump pending save");

        assert_eq!(app.records_saved(), 1);
        assert_eq!(app.status(), "Shranjenih je bilo 1 računov.");

        let year = Local::now().year();
        let ledger_path = dir.path().join(format!("knjiga_racunov_{year}.csv"));
        let ledger = std::fs::read_to_string(&ledger_path).expect("read ledger");
        assert!(ledger.contains("Podjetje d.o.o."));

        let yy = year % 100;
        let document_path = dir.path().join(format!("racun_st.JN{yy:02}-001.txt"));
        let document = std::fs::read_to_string(&document_path).expect("read document");
        assert!(document.contains(&format!("Račun št. JN{yy:02}-001")));

        // The form is back at its defaults with the sequence advanced.
        assert_eq!(
            app.form().text(keys::ST_RACUNA).expect("read number"),
            "002"
        );
        assert_eq!(app.form().text(keys::NAZIV).expect("read naziv"), "");
    }

    #[test]
    fn failed_save_leaves_the_form_untouched() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let mut app = Application::new(dir.path()).expect("construct application");
        fill_required_fields(&mut app);

        // A non-numeric amount makes the record unreadable.
        app.form().set_text(keys::ZNESEK, "veliko").expect("set znesek");
        app.form().save();

        let result = app.pump();
        assert!(result.is_err());
        assert_eq!(app.records_saved(), 0);
        assert_eq!(
            app.status(),
            "Error in field: Znesek. Data was not saved!"
        );
        assert_eq!(
            app.form().text(keys::NAZIV).expect("read naziv"),
            "Podjetje d.o.o."
        );
    }
}
