//! Domain types for the Motorista API.
//!
//! These mirror the backend's wire format exactly: camelCase field names and
//! the Portuguese enum values the server emits. The create/update DTOs use
//! `role` on the wire while the entity itself uses `perfil`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User role as known to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "USUARIO")]
    Usuario,
    #[serde(rename = "MOTORISTA")]
    Motorista,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Usuario => "USUARIO",
            Role::Motorista => "MOTORISTA",
            Role::Admin => "ADMIN",
        }
    }

    /// Derive a role from a token scope claim, stripping the `ROLE_` prefix.
    /// Absent or unrecognized scopes fall back to the least-privileged role.
    pub fn from_scope(scope: Option<&str>) -> Self {
        match scope.map(|s| s.strip_prefix("ROLE_").unwrap_or(s)) {
            Some("MOTORISTA") => Role::Motorista,
            Some("ADMIN") => Role::Admin,
            _ => Role::Usuario,
        }
    }
}

/// Account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "ATIVO")]
    Ativo,
    #[serde(rename = "INATIVO")]
    Inativo,
    #[serde(rename = "BLOQUEADO")]
    Bloqueado,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ativo => "ATIVO",
            Status::Inativo => "INATIVO",
            Status::Bloqueado => "BLOQUEADO",
        }
    }
}

/// Vehicle types a driver can operate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TipoVeiculo {
    #[serde(rename = "VAN")]
    Van,
    #[serde(rename = "TOCO")]
    Toco,
    #[serde(rename = "BAU")]
    Bau,
    #[serde(rename = "SIDER")]
    Sider,
    #[serde(rename = "TRUCK")]
    Truck,
    #[serde(rename = "BITRUCK")]
    Bitruck,
    #[serde(rename = "CARRETA")]
    Carreta,
    #[serde(rename = "CAMINHAO_3_4")]
    Caminhao34,
}

impl TipoVeiculo {
    pub fn as_str(&self) -> &'static str {
        match self {
            TipoVeiculo::Van => "VAN",
            TipoVeiculo::Toco => "TOCO",
            TipoVeiculo::Bau => "BAU",
            TipoVeiculo::Sider => "SIDER",
            TipoVeiculo::Truck => "TRUCK",
            TipoVeiculo::Bitruck => "BITRUCK",
            TipoVeiculo::Carreta => "CARRETA",
            TipoVeiculo::Caminhao34 => "CAMINHAO_3_4",
        }
    }

    /// Display label matching the backend catalog.
    pub fn label(&self) -> &'static str {
        match self {
            TipoVeiculo::Van => "Van",
            TipoVeiculo::Toco => "Toco",
            TipoVeiculo::Bau => "Baú",
            TipoVeiculo::Sider => "Sider",
            TipoVeiculo::Truck => "Truck",
            TipoVeiculo::Bitruck => "Bitruck",
            TipoVeiculo::Carreta => "Carreta",
            TipoVeiculo::Caminhao34 => "Caminhão 3/4",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USUARIO" => Ok(Role::Usuario),
            "MOTORISTA" => Ok(Role::Motorista),
            "ADMIN" => Ok(Role::Admin),
            other => Err(format!("perfil desconhecido: {other}")),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ATIVO" => Ok(Status::Ativo),
            "INATIVO" => Ok(Status::Inativo),
            "BLOQUEADO" => Ok(Status::Bloqueado),
            other => Err(format!("status desconhecido: {other}")),
        }
    }
}

impl std::str::FromStr for TipoVeiculo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "VAN" => Ok(TipoVeiculo::Van),
            "TOCO" => Ok(TipoVeiculo::Toco),
            "BAU" => Ok(TipoVeiculo::Bau),
            "SIDER" => Ok(TipoVeiculo::Sider),
            "TRUCK" => Ok(TipoVeiculo::Truck),
            "BITRUCK" => Ok(TipoVeiculo::Bitruck),
            "CARRETA" => Ok(TipoVeiculo::Carreta),
            "CAMINHAO_3_4" => Ok(TipoVeiculo::Caminhao34),
            other => Err(format!("tipo de veículo desconhecido: {other}")),
        }
    }
}

/// A driver record as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: String,
    pub nome: String,
    pub email: String,
    pub telefone: String,
    pub cidade: String,
    pub uf: String,
    pub perfil: Role,
    pub status: Status,
    #[serde(default)]
    pub tipos_veiculo: Vec<TipoVeiculo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for creating a driver. `senha` is mandatory here; the update
/// payload is the optional-field variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDriverRequest {
    pub nome: String,
    pub email: String,
    pub senha: String,
    pub telefone: String,
    pub cidade: String,
    pub uf: String,
    pub role: Role,
    pub status: Status,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tipos_veiculo: Vec<TipoVeiculo>,
}

/// Payload for updating a driver. Every field is optional; absent fields are
/// left untouched server-side and never serialized. A blank password or an
/// empty vehicle-type set must be normalized to `None` by the caller (see
/// [`UpdateDriverRequest::normalized`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDriverRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub senha: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipos_veiculo: Option<Vec<TipoVeiculo>>,
}

impl UpdateDriverRequest {
    /// Drop a blank password and an empty vehicle-type set so they are
    /// omitted from the serialized payload.
    pub fn normalized(mut self) -> Self {
        if self.senha.as_deref().is_some_and(|s| s.trim().is_empty()) {
            self.senha = None;
        }
        if self.tipos_veiculo.as_deref().is_some_and(|t| t.is_empty()) {
            self.tipos_veiculo = None;
        }
        self
    }
}

/// Search criteria for the driver list. Absent fields are not serialized and
/// therefore not constrained server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texto: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipos_veiculo: Option<Vec<TipoVeiculo>>,
}

impl DriverFilter {
    pub fn is_empty(&self) -> bool {
        self.texto.is_none()
            && self.uf.is_none()
            && self.cidade.is_none()
            && self.tipos_veiculo.is_none()
    }
}

/// One page of results in the backend's Spring-style envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    pub size: u32,
    /// Zero-based page index.
    pub number: u32,
    pub first: bool,
    pub last: bool,
}

/// Sort direction for list reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// A field + direction pair, serialized as `field,asc` in the query string.
/// The field name is passed through to the backend unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn to_query(&self) -> String {
        format!("{},{}", self.field, self.direction.as_str())
    }

    /// Parse `field,asc|desc`; a bare field name sorts ascending.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(',') {
            Some((field, "desc")) => SortSpec::new(field, SortDirection::Desc),
            Some((field, _)) => SortSpec::new(field, SortDirection::Asc),
            None => SortSpec::new(raw, SortDirection::Asc),
        }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        SortSpec::new("nome", SortDirection::Asc)
    }
}

/// Catalog entry from GET /vehicle-types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleType {
    pub value: String,
    pub label: String,
}

/// The identity derived from a login token's claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub nome: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_wire_field_names() {
        let json = serde_json::json!({
            "id": "7",
            "nome": "Ana Souza",
            "email": "ana@exemplo.com",
            "telefone": "11911112222",
            "cidade": "São Paulo",
            "uf": "SP",
            "perfil": "MOTORISTA",
            "status": "ATIVO",
            "tiposVeiculo": ["VAN", "CAMINHAO_3_4"],
            "createdAt": "2024-03-01T12:00:00Z"
        });
        let driver: Driver = serde_json::from_value(json).unwrap();
        assert_eq!(driver.perfil, Role::Motorista);
        assert_eq!(
            driver.tipos_veiculo,
            vec![TipoVeiculo::Van, TipoVeiculo::Caminhao34]
        );
        assert!(driver.updated_at.is_none());

        let back = serde_json::to_value(&driver).unwrap();
        assert_eq!(back["tiposVeiculo"][1], "CAMINHAO_3_4");
        assert_eq!(back["perfil"], "MOTORISTA");
    }

    #[test]
    fn test_driver_without_vehicle_types_deserializes_empty() {
        let json = serde_json::json!({
            "id": "1",
            "nome": "Sem Veículo",
            "email": "sem@exemplo.com",
            "telefone": "11900001111",
            "cidade": "Campinas",
            "uf": "SP",
            "perfil": "USUARIO",
            "status": "INATIVO"
        });
        let driver: Driver = serde_json::from_value(json).unwrap();
        assert!(driver.tipos_veiculo.is_empty());
    }

    #[test]
    fn test_create_payload_requires_senha_and_uses_role_key() {
        let req = CreateDriverRequest {
            nome: "Ana".into(),
            email: "ana@exemplo.com".into(),
            senha: "segredo1".into(),
            telefone: "11911112222".into(),
            cidade: "Santos".into(),
            uf: "SP".into(),
            role: Role::Motorista,
            status: Status::Ativo,
            tipos_veiculo: vec![TipoVeiculo::Van, TipoVeiculo::Bau],
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["senha"], "segredo1");
        assert_eq!(value["role"], "MOTORISTA");
        assert!(value.get("perfil").is_none());
    }

    #[test]
    fn test_update_payload_omits_blank_senha_and_empty_tipos() {
        let req = UpdateDriverRequest {
            nome: Some("Novo Nome".into()),
            senha: Some("".into()),
            tipos_veiculo: Some(vec![]),
            ..Default::default()
        }
        .normalized();

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["nome"], "Novo Nome");
        assert!(value.get("senha").is_none());
        assert!(value.get("tiposVeiculo").is_none());
        assert!(value.get("email").is_none());
    }

    #[test]
    fn test_update_payload_keeps_real_senha_and_tipos() {
        let req = UpdateDriverRequest {
            senha: Some("novasenha".into()),
            tipos_veiculo: Some(vec![TipoVeiculo::Carreta]),
            ..Default::default()
        }
        .normalized();

        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["senha"], "novasenha");
        assert_eq!(value["tiposVeiculo"][0], "CARRETA");
    }

    #[test]
    fn test_filter_skips_absent_fields() {
        let filter = DriverFilter {
            texto: Some("ana".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&filter).unwrap();
        assert_eq!(value["texto"], "ana");
        assert!(value.get("uf").is_none());
        assert!(value.get("cidade").is_none());
        assert!(value.get("tiposVeiculo").is_none());
    }

    #[test]
    fn test_role_from_scope_strips_prefix_and_defaults() {
        assert_eq!(Role::from_scope(Some("ROLE_ADMIN")), Role::Admin);
        assert_eq!(Role::from_scope(Some("MOTORISTA")), Role::Motorista);
        assert_eq!(Role::from_scope(Some("ROLE_DESCONHECIDO")), Role::Usuario);
        assert_eq!(Role::from_scope(None), Role::Usuario);
    }

    #[test]
    fn test_sort_spec_round_trip() {
        assert_eq!(SortSpec::default().to_query(), "nome,asc");
        assert_eq!(
            SortSpec::parse("email,desc"),
            SortSpec::new("email", SortDirection::Desc)
        );
        assert_eq!(
            SortSpec::parse("cidade"),
            SortSpec::new("cidade", SortDirection::Asc)
        );
        // Arbitrary fields pass through untouched.
        assert_eq!(SortSpec::parse("updatedAt,desc").to_query(), "updatedAt,desc");
    }

    #[test]
    fn test_enum_from_str_is_case_insensitive() {
        assert_eq!("motorista".parse::<Role>().unwrap(), Role::Motorista);
        assert_eq!("BLOQUEADO".parse::<Status>().unwrap(), Status::Bloqueado);
        assert_eq!(
            "caminhao_3_4".parse::<TipoVeiculo>().unwrap(),
            TipoVeiculo::Caminhao34
        );
        assert!("GERENTE".parse::<Role>().is_err());
    }

    #[test]
    fn test_page_envelope_parses() {
        let json = serde_json::json!({
            "content": [],
            "totalElements": 42,
            "totalPages": 5,
            "size": 10,
            "number": 0,
            "first": true,
            "last": false
        });
        let page: Page<Driver> = serde_json::from_value(json).unwrap();
        assert_eq!(page.total_pages, 5);
        assert!(page.content.len() <= page.size as usize);
    }
}
