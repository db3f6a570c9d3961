//! Client-side shape checks for driver payloads.
//!
//! These run before any network call and block submission with per-field
//! messages. They are deliberately shallow: business rules (duplicate
//! emails, role permissions) belong to the backend.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::{CreateDriverRequest, UpdateDriverRequest};

lazy_static! {
    /// Regex for a plausibly well-formed email address.
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// The Brazilian federative units, the domain of the `uf` field.
pub const UFS: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB", "PR",
    "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

/// Per-field validation failures, keyed by field name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("validação falhou: {}", summary(.errors))]
pub struct ValidationErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn field_errors(&self) -> &BTreeMap<String, Vec<String>> {
        &self.errors
    }
}

fn summary(errors: &BTreeMap<String, Vec<String>>) -> String {
    errors
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join("; ")))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Collects field errors and turns them into a single result.
#[derive(Debug, Default)]
struct ErrorBuilder {
    errors: BTreeMap<String, Vec<String>>,
}

impl ErrorBuilder {
    fn check(&mut self, field: &str, result: Result<(), String>) {
        if let Err(message) = result {
            self.errors.entry(field.to_string()).or_default().push(message);
        }
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors { errors: self.errors })
        }
    }
}

// -------------------------------------------------------------------------
// Field rules
// -------------------------------------------------------------------------

fn validate_nome(nome: &str) -> Result<(), String> {
    if nome.trim().chars().count() < 3 {
        return Err("Nome deve ter no mínimo 3 caracteres".to_string());
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), String> {
    if !EMAIL_REGEX.is_match(email.trim()) {
        return Err("Email inválido".to_string());
    }
    Ok(())
}

fn validate_telefone(telefone: &str) -> Result<(), String> {
    if telefone.trim().chars().count() < 10 {
        return Err("Telefone inválido".to_string());
    }
    Ok(())
}

fn validate_cidade(cidade: &str) -> Result<(), String> {
    if cidade.trim().chars().count() < 2 {
        return Err("Cidade é obrigatória".to_string());
    }
    Ok(())
}

fn validate_uf(uf: &str) -> Result<(), String> {
    let uf = uf.trim().to_uppercase();
    if uf.len() != 2 || !UFS.contains(&uf.as_str()) {
        return Err("Selecione uma UF".to_string());
    }
    Ok(())
}

fn validate_senha(senha: &str) -> Result<(), String> {
    if senha.chars().count() < 6 {
        return Err("Senha deve ter no mínimo 6 caracteres".to_string());
    }
    Ok(())
}

// -------------------------------------------------------------------------
// Payload validation
// -------------------------------------------------------------------------

/// Validate a create payload. The password is mandatory here.
pub fn validate_create(req: &CreateDriverRequest) -> Result<(), ValidationErrors> {
    let mut builder = ErrorBuilder::default();
    builder.check("nome", validate_nome(&req.nome));
    builder.check("email", validate_email(&req.email));
    builder.check("senha", validate_senha(&req.senha));
    builder.check("telefone", validate_telefone(&req.telefone));
    builder.check("cidade", validate_cidade(&req.cidade));
    builder.check("uf", validate_uf(&req.uf));
    builder.finish()
}

/// Validate an update payload: only the fields present are checked, and the
/// password rule applies only when a new one was actually provided. Callers
/// should normalize the payload first so blank passwords are absent.
pub fn validate_update(req: &UpdateDriverRequest) -> Result<(), ValidationErrors> {
    let mut builder = ErrorBuilder::default();
    if let Some(nome) = &req.nome {
        builder.check("nome", validate_nome(nome));
    }
    if let Some(email) = &req.email {
        builder.check("email", validate_email(email));
    }
    if let Some(senha) = &req.senha {
        builder.check("senha", validate_senha(senha));
    }
    if let Some(telefone) = &req.telefone {
        builder.check("telefone", validate_telefone(telefone));
    }
    if let Some(cidade) = &req.cidade {
        builder.check("cidade", validate_cidade(cidade));
    }
    if let Some(uf) = &req.uf {
        builder.check("uf", validate_uf(uf));
    }
    builder.finish()
}
