//! UI-facing conversion between language identifiers and records.
//!
//! Form components submit a language as its decimal identifier string and
//! render one from a record. [`LanguageConverter`] does the lookup and the
//! formatting; it is deliberately the only place the admin UI touches
//! language identity.

use newsdesk_types::{Language, Record, RecordId};

use crate::error::DataError;
use crate::gateway::DataGateway;
use crate::session::Session;

/// Errors raised while converting between strings and [`Language`] records.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The submitted string is not a decimal record identifier.
    #[error("not a language identifier: {input:?}")]
    InvalidIdentifier {
        /// The rejected input.
        input: String,
    },

    /// No language exists with the submitted identifier.
    #[error("no language with id {id}")]
    UnknownLanguage {
        /// The identifier that matched nothing.
        id: RecordId,
    },

    /// The lookup itself failed.
    #[error(transparent)]
    Data(DataError),
}

/// Converts between submitted identifier strings and [`Language`] records.
#[derive(Debug)]
pub struct LanguageConverter<'a, S: Session> {
    gateway: &'a DataGateway<S>,
}

impl<'a, S: Session> LanguageConverter<'a, S> {
    /// Create a converter bound to a gateway.
    pub const fn new(gateway: &'a DataGateway<S>) -> Self {
        Self { gateway }
    }

    /// Resolve a submitted identifier string to its [`Language`] record.
    ///
    /// # Errors
    ///
    /// Returns [`ConvertError::InvalidIdentifier`] if `input` does not
    /// parse as a decimal identifier and [`ConvertError::UnknownLanguage`]
    /// if nothing is stored under it.
    pub fn as_record(&self, input: &str) -> Result<Language, ConvertError> {
        let Ok(id) = input.trim().parse::<i64>() else {
            return Err(ConvertError::InvalidIdentifier {
                input: input.to_owned(),
            });
        };
        let id = RecordId(id);
        self.gateway
            .find_by_id::<Language>(Some(id))
            .map_err(|err| match err {
                DataError::NotFound { .. } => ConvertError::UnknownLanguage { id },
                other => ConvertError::Data(other),
            })
    }

    /// Render a language for display in a form field.
    ///
    /// `None` and unsaved records render as the empty string; persisted
    /// records render as their decimal identifier.
    pub fn as_display(&self, language: Option<&Language>) -> String {
        language
            .and_then(Record::id)
            .map_or_else(String::new, |id| id.to_string())
    }
}
