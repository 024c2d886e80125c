//! Company resource model and fixtures.

use serde::{Deserialize, Serialize};

/// Messages the service returns.
pub mod messages {
    /// CNPJ contains something other than digits.
    pub const CNPJ_DIGITS_ONLY: &str = "CNPJ deve conter apenas números";
    /// CNPJ is missing or not exactly fourteen characters.
    pub const CNPJ_LENGTH: &str = "CNPJ deve ter 14 dígitos";
    /// State is missing or empty.
    pub const STATE_REQUIRED: &str = "Estado é obrigatório";
    /// Sector is missing or empty.
    pub const SECTOR_REQUIRED: &str = "Setor é obrigatório";
    /// Another company already uses the CNPJ.
    pub const CNPJ_TAKEN: &str = "CNPJ já está cadastrado";
    /// Successful update.
    pub const UPDATED: &str = "Empresa atualizada com sucesso";
    /// Successful delete.
    pub const DELETED: &str = "Empresa deletada com sucesso";
    /// Unknown id.
    pub const NOT_FOUND: &str = "Empresa não encontrada";
}

/// Id no scenario ever creates, used for lookups and updates.
pub const MISSING_ID: u64 = 9999;

/// Id no scenario ever creates, used for deletes.
pub const MISSING_DELETE_ID: u64 = 99_999;

/// A company as the service stores and returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Server-assigned id.
    pub id: u64,
    /// Trading name.
    #[serde(default)]
    pub name: String,
    /// Street address.
    #[serde(default)]
    pub address: String,
    /// City.
    #[serde(default)]
    pub city: String,
    /// State; required.
    #[serde(default)]
    pub state: String,
    /// Country.
    #[serde(default)]
    pub country: String,
    /// Business sector; required.
    #[serde(default)]
    pub sector: String,
    /// Fourteen-digit registration number, unique per company.
    #[serde(default)]
    pub cnpj: String,
}

/// Payload for `POST /company`. Fields mirror [`Company`].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompany {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub sector: String,
    pub cnpj: String,
}

impl NewCompany {
    /// The company created, read, updated and deleted by the happy-path
    /// scenarios.
    #[must_use]
    pub fn valid() -> Self {
        Self {
            name: "Empresa y".into(),
            address: "Rua logo ali 123".into(),
            city: "Criciuma".into(),
            state: "Santa Catarina".into(),
            country: "Brasil".into(),
            sector: "Tecnologia".into(),
            cnpj: "12344558000145".into(),
        }
    }

    /// Well-formed in every field except the CNPJ.
    #[must_use]
    pub fn with_invalid_cnpj() -> Self {
        Self {
            name: "empresa com CNPJ invalido".into(),
            address: "123 rua test".into(),
            city: "Criciteste".into(),
            state: "Estado teste".into(),
            country: "Testado".into(),
            sector: "testetecnology".into(),
            cnpj: "cnpjinvalido".into(),
        }
    }

    /// Reuses [`CompanyUpdate::valid`]'s CNPJ, which the duplicate scenario
    /// registers first.
    #[must_use]
    pub fn duplicate() -> Self {
        Self {
            name: "Teste cnpj duplicado".into(),
            address: "1234 rua teste".into(),
            city: "teste cidade".into(),
            state: "teste estado".into(),
            country: "pais teste".into(),
            sector: "Technology".into(),
            cnpj: DUPLICATE_CNPJ.into(),
        }
    }

    /// The two companies created by the bulk scenario.
    #[must_use]
    pub fn batch() -> [Self; 2] {
        [
            Self {
                name: "Empresa A".into(),
                address: "456 rua tal".into(),
                city: "cidade A".into(),
                state: "estado A".into(),
                country: "pais A".into(),
                sector: "Finanças".into(),
                cnpj: "12345678000155".into(),
            },
            Self {
                name: "Empresa B".into(),
                address: "789 rua nao sei".into(),
                city: "cidade B".into(),
                state: "estado B".into(),
                country: "pais B".into(),
                sector: "Advocacia".into(),
                cnpj: "12345678000149".into(),
            },
        ]
    }

    /// Same company under another CNPJ.
    #[must_use]
    pub fn with_cnpj(mut self, cnpj: impl Into<String>) -> Self {
        self.cnpj = cnpj.into();
        self
    }
}

/// CNPJ shared by the update and duplicate scenarios.
pub const DUPLICATE_CNPJ: &str = "11445889000198";

/// Payload for `PUT /company/{id}`. Absent fields are left untouched.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnpj: Option<String>,
}

impl CompanyUpdate {
    /// Renames the company and moves it to [`DUPLICATE_CNPJ`].
    #[must_use]
    pub fn valid() -> Self {
        Self {
            name: Some("Empresa y atualizado".into()),
            state: Some("Santa Catarina atualizado".into()),
            sector: Some("Tecnologia e Informatica".into()),
            cnpj: Some(DUPLICATE_CNPJ.into()),
            ..Self::default()
        }
    }

    /// A rename with a malformed CNPJ.
    #[must_use]
    pub fn with_invalid_cnpj() -> Self {
        Self {
            name: Some("Empresa y atualizada".into()),
            cnpj: Some("cnpjerrado".into()),
            ..Self::default()
        }
    }

    /// Only a new name.
    #[must_use]
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// URLs of the company resource under one base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyApi {
    base: String,
}

impl CompanyApi {
    /// `base` is the service root, e.g. `https://api-desafio-qa.onrender.com`.
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// `{base}/company`.
    #[must_use]
    pub fn collection(&self) -> String {
        format!("{}/company", self.base)
    }

    /// `{base}/company/{id}`.
    #[must_use]
    pub fn item(&self, id: u64) -> String {
        format!("{}/company/{id}", self.base)
    }
}
