use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use rust_embed::RustEmbed;
use serde::Deserialize;

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Assets;

const DEFAULT_PROFILE: &str = "izdajatelj.toml";

#[derive(Debug)]
pub enum ProfileError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { source: toml::de::Error },
    MissingEmbeddedDefault,
}

impl Display for ProfileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::Io { path, source } => {
                write!(f, "failed reading issuer profile {}: {source}", path.display())
            }
            ProfileError::Parse { source } => {
                write!(f, "issuer profile is not valid TOML: {source}")
            }
            ProfileError::MissingEmbeddedDefault => {
                write!(f, "embedded issuer profile {DEFAULT_PROFILE} is absent")
            }
        }
    }
}

impl std::error::Error for ProfileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProfileError::Io { source, .. } => Some(source),
            ProfileError::Parse { source } => Some(source),
            ProfileError::MissingEmbeddedDefault => None,
        }
    }
}

/// Identity of the invoice issuer as printed in the document header and used
/// to derive invoice numbers.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct IssuerProfile {
    pub name: String,
    pub street: String,
    pub post_nr: String,
    pub city: String,
    pub tax_nr: String,
    pub iban: String,
    pub bank: String,
    pub bic: String,
    pub place: String,
}

impl IssuerProfile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ProfileError::Parse { source })
    }

    /// The profile compiled into the binary, used when no file is present.
    pub fn embedded_default() -> Result<Self, ProfileError> {
        let asset = Assets::get(DEFAULT_PROFILE).ok_or(ProfileError::MissingEmbeddedDefault)?;
        let content = String::from_utf8_lossy(asset.data.as_ref());
        toml::from_str(&content).map_err(|source| ProfileError::Parse { source })
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Self::embedded_default()
        }
    }

    /// Uppercased first letters of the first two words of the issuer's name,
    /// the prefix of every invoice number.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .take(2)
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_parses() {
        let profile = IssuerProfile::embedded_default().expect("embedded profile");
        assert_eq!(profile.name, "Janez Novak");
        assert_eq!(profile.place, "Ljubljana");
    }

    #[test]
    fn initials_take_the_first_two_words() {
        let profile = IssuerProfile::embedded_default().expect("embedded profile");
        assert_eq!(profile.initials(), "JN");
    }

    #[test]
    fn initials_of_a_single_word_name() {
        let mut profile = IssuerProfile::embedded_default().expect("embedded profile");
        profile.name = "mojca".to_string();
        assert_eq!(profile.initials(), "M");
    }

    #[test]
    fn load_falls_back_to_the_embedded_profile() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let missing = dir.path().join("izdajatelj.toml");
        let profile = IssuerProfile::load_or_default(&missing).expect("fallback profile");
        assert_eq!(profile, IssuerProfile::embedded_default().expect("embedded profile"));
    }

    #[test]
    fn load_reads_a_profile_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("izdajatelj.toml");
        std::fs::write(
            &path,
            concat!(
                "name = \"Mojca Kovač\"\n",
                "street = \"Trg 1\"\n",
                "post_nr = \"2000\"\n",
                "city = \"Maribor\"\n",
                "tax_nr = \"11111111\"\n",
                "iban = \"SI56 9999 8888 7777 666\"\n",
                "bank = \"Banka\"\n",
                "bic = \"XXXXSI2X\"\n",
                "place = \"Maribor\"\n",
            ),
        )
        .expect("write profile file");
        let profile = IssuerProfile::load_or_default(&path).expect("load profile");
        assert_eq!(profile.name, "Mojca Kovač");
        assert_eq!(profile.initials(), "MK");
    }
}
