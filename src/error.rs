//! Domain errors.
//!
//! I/O, decoding and GPU set-up report through `anyhow`; failures the caller
//! is expected to branch on get a dedicated type here.

use thiserror::Error;

use crate::data_structures::material::Role;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("no top-level node named {expected_name:?} for the {role} role")]
    MissingNode { role: Role, expected_name: String },
}

impl BindingError {
    pub fn expected_name(&self) -> &str {
        match self {
            BindingError::MissingNode { expected_name, .. } => expected_name,
        }
    }
}

pub type BindingResult<T> = Result<T, BindingError>;
