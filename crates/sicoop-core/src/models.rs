//! Record types and closed status enumerations.
//!
//! Records mirror the rows of the remote store; column names follow the
//! store and are mapped with serde renames. Status and role values are
//! closed enums with a single mapping to wire value, display label and
//! display tone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque, stable identifier of a row, unique within its collection.
///
/// The store hands out UUIDs for most tables and bigint keys for a few;
/// both are kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<uuid::Uuid> for RecordId {
    fn from(id: uuid::Uuid) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Int(i64),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => RecordId(s),
            RawId::Int(n) => RecordId(n.to_string()),
        })
    }
}

// =============================================================================
// DISPLAY TONE
// =============================================================================

/// Visual tone of a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Info,
    Warning,
    Success,
    Danger,
}

impl Tone {
    /// Badge classes used by the rendered tables.
    pub fn badge_class(&self) -> &'static str {
        match self {
            Self::Neutral => "bg-gray-100 text-gray-800",
            Self::Info => "bg-blue-100 text-blue-800",
            Self::Warning => "bg-yellow-100 text-yellow-800",
            Self::Success => "bg-green-100 text-green-800",
            Self::Danger => "bg-red-100 text-red-800",
        }
    }
}

// =============================================================================
// ANALYSIS STATUS
// =============================================================================

/// Lifecycle of a technical analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    #[default]
    Pendente,
    EmAnalise,
    Concluida,
    Cancelada,
}

impl AnalysisStatus {
    pub const ALL: [AnalysisStatus; 4] = [
        Self::Pendente,
        Self::EmAnalise,
        Self::Concluida,
        Self::Cancelada,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pendente => "pendente",
            Self::EmAnalise => "em_analise",
            Self::Concluida => "concluida",
            Self::Cancelada => "cancelada",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pendente => "Pendente",
            Self::EmAnalise => "Em Análise",
            Self::Concluida => "Concluída",
            Self::Cancelada => "Cancelada",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Self::Pendente => Tone::Warning,
            Self::EmAnalise => Tone::Info,
            Self::Concluida => Tone::Success,
            Self::Cancelada => Tone::Danger,
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnalysisStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pendente" => Ok(Self::Pendente),
            "em_analise" => Ok(Self::EmAnalise),
            "concluida" => Ok(Self::Concluida),
            "cancelada" => Ok(Self::Cancelada),
            _ => Err(format!("Invalid analysis status: {}", s)),
        }
    }
}

// =============================================================================
// MESSAGE STATUS
// =============================================================================

/// Handling state of a client message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Pendente,
    Lida,
    Respondida,
    Arquivada,
}

impl MessageStatus {
    pub const ALL: [MessageStatus; 4] = [
        Self::Pendente,
        Self::Lida,
        Self::Respondida,
        Self::Arquivada,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pendente => "pendente",
            Self::Lida => "lida",
            Self::Respondida => "respondida",
            Self::Arquivada => "arquivada",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pendente => "Pendente",
            Self::Lida => "Lida",
            Self::Respondida => "Respondida",
            Self::Arquivada => "Arquivada",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Self::Pendente => Tone::Warning,
            Self::Lida => Tone::Info,
            Self::Respondida => Tone::Success,
            Self::Arquivada => Tone::Neutral,
        }
    }
}

impl std::fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MessageStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pendente" => Ok(Self::Pendente),
            "lida" => Ok(Self::Lida),
            "respondida" => Ok(Self::Respondida),
            "arquivada" => Ok(Self::Arquivada),
            _ => Err(format!("Invalid message status: {}", s)),
        }
    }
}

// =============================================================================
// USER ROLE
// =============================================================================

/// Role of a user account. Drives both capability checks and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Technician,
    #[default]
    Client,
}

impl UserRole {
    pub const ALL: [UserRole; 3] = [Self::Admin, Self::Technician, Self::Client];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Technician => "technician",
            Self::Client => "client",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Admin => "Administrador",
            Self::Technician => "Técnico",
            Self::Client => "Cliente",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Self::Admin => Tone::Danger,
            Self::Technician => Tone::Info,
            Self::Client => Tone::Neutral,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "technician" => Ok(Self::Technician),
            "client" => Ok(Self::Client),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// =============================================================================
// NOTIFICATION LOG STATUS
// =============================================================================

/// Delivery state of a queued notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLogStatus {
    #[default]
    Pending,
    Sent,
    Failed,
}

impl NotificationLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pendente",
            Self::Sent => "Enviada",
            Self::Failed => "Falhou",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Self::Pending => Tone::Warning,
            Self::Sent => Tone::Success,
            Self::Failed => Tone::Danger,
        }
    }
}

impl std::fmt::Display for NotificationLogStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NotificationLogStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid notification status: {}", s)),
        }
    }
}

// =============================================================================
// ACTIVE STATE
// =============================================================================

/// On/off axis for rows whose "status" is a boolean column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActiveState {
    #[default]
    Active,
    Inactive,
}

impl ActiveState {
    pub fn from_flag(flag: bool) -> Self {
        if flag {
            Self::Active
        } else {
            Self::Inactive
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Active => "Ativo",
            Self::Inactive => "Inativo",
        }
    }

    pub fn tone(&self) -> Tone {
        match self {
            Self::Active => Tone::Success,
            Self::Inactive => Tone::Neutral,
        }
    }
}

impl std::fmt::Display for ActiveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

impl std::str::FromStr for ActiveState {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" | "true" => Ok(Self::Active),
            "inactive" | "false" => Ok(Self::Inactive),
            _ => Err(format!("Invalid active state: {}", s)),
        }
    }
}

// =============================================================================
// ANALYSES
// =============================================================================

/// A technical analysis requested for a rural property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: RecordId,
    #[serde(rename = "nome")]
    pub client_name: String,
    pub email: String,
    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,
    #[serde(rename = "nome_propriedade", default)]
    pub property_name: Option<String>,
    #[serde(rename = "cultura", default)]
    pub crop: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub area_hectares: Option<f64>,
    #[serde(rename = "observacoes", default)]
    pub notes: Option<String>,
    pub status: AnalysisStatus,
    /// Technician responsible for the analysis.
    #[serde(rename = "responsavel_id", default)]
    pub assignee_id: Option<RecordId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Fields sent when creating or editing an analysis.
///
/// Draft optionals serialize as `null` so an edit clears the column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisDraft {
    #[serde(rename = "nome")]
    pub client_name: String,
    pub email: String,
    #[serde(rename = "telefone")]
    pub phone: Option<String>,
    #[serde(rename = "nome_propriedade")]
    pub property_name: Option<String>,
    #[serde(rename = "cultura")]
    pub crop: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub area_hectares: Option<f64>,
    #[serde(rename = "observacoes")]
    pub notes: Option<String>,
    pub status: AnalysisStatus,
}

// =============================================================================
// MESSAGES
// =============================================================================

/// A message sent by a client through the contact form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: RecordId,
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefone", default)]
    pub phone: Option<String>,
    #[serde(rename = "assunto", default)]
    pub subject: Option<String>,
    #[serde(rename = "mensagem")]
    pub body: String,
    pub status: MessageStatus,
    #[serde(rename = "atribuido_a", default)]
    pub assignee_id: Option<RecordId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageDraft {
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefone")]
    pub phone: Option<String>,
    #[serde(rename = "assunto")]
    pub subject: Option<String>,
    #[serde(rename = "mensagem")]
    pub body: String,
    pub status: MessageStatus,
}

// =============================================================================
// USERS & ROLES
// =============================================================================

/// A user profile (one row per authenticated account).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    pub role: UserRole,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Name shown in tables and selectors; falls back to the email.
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDraft {
    pub email: String,
    pub full_name: Option<String>,
    pub role: UserRole,
}

/// A role definition as listed in the authorizations screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: RecordId,
    pub name: UserRole,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleDraft {
    pub name: UserRole,
    pub description: Option<String>,
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

/// A kind of notification users can subscribe to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationCategory {
    pub id: RecordId,
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationCategoryDraft {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

/// Per-user subscription to a notification category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSetting {
    pub id: RecordId,
    pub user_id: RecordId,
    pub category_id: RecordId,
    #[serde(default = "default_true")]
    pub email_enabled: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationSettingDraft {
    pub user_id: RecordId,
    pub category_id: RecordId,
    pub email_enabled: bool,
}

/// A notification queued for (or already through) delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationLog {
    pub id: RecordId,
    #[serde(default)]
    pub user_id: Option<RecordId>,
    #[serde(default)]
    pub category_id: Option<RecordId>,
    pub email: String,
    pub subject: String,
    #[serde(default)]
    pub content: Option<String>,
    pub status: NotificationLogStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationLogDraft {
    pub user_id: Option<RecordId>,
    pub category_id: Option<RecordId>,
    pub email: String,
    pub subject: String,
    pub content: Option<String>,
    pub status: NotificationLogStatus,
    pub error_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl NotificationLogDraft {
    /// Draft that rewrites a log row with a new delivery outcome.
    pub fn from_log(log: &NotificationLog) -> Self {
        Self {
            user_id: log.user_id.clone(),
            category_id: log.category_id.clone(),
            email: log.email.clone(),
            subject: log.subject.clone(),
            content: log.content.clone(),
            status: log.status,
            error_message: log.error_message.clone(),
            sent_at: log.sent_at,
        }
    }
}

// =============================================================================
// NOTIFICATION PROCESSING
// =============================================================================

/// Response of `POST /api/process-pending-notifications`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessingResponse {
    pub fn processed(count: u64, message: impl Into<String>) -> Self {
        Self {
            success: true,
            processed_count: Some(count),
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            processed_count: None,
            message: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_from_number_and_text() {
        let a: RecordId = serde_json::from_str("42").unwrap();
        let b: RecordId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"42\"");
    }

    #[test]
    fn test_analysis_status_wire_values() {
        for status in AnalysisStatus::ALL {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(status.as_str().parse::<AnalysisStatus>().unwrap(), status);
        }
        assert!("em análise".parse::<AnalysisStatus>().is_err());
    }

    #[test]
    fn test_status_labels_and_tones() {
        assert_eq!(AnalysisStatus::EmAnalise.label(), "Em Análise");
        assert_eq!(AnalysisStatus::Concluida.tone(), Tone::Success);
        assert_eq!(MessageStatus::Pendente.tone(), Tone::Warning);
        assert_eq!(UserRole::Technician.label(), "Técnico");
        assert_eq!(
            NotificationLogStatus::Failed.tone().badge_class(),
            "bg-red-100 text-red-800"
        );
    }

    #[test]
    fn test_user_role_parse_is_case_insensitive() {
        assert_eq!("Technician".parse::<UserRole>().unwrap(), UserRole::Technician);
        assert!("root".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_analysis_deserializes_store_row() {
        let row = serde_json::json!({
            "id": "a1",
            "nome": "João Silva",
            "email": "joao@fazenda.com",
            "cultura": "soja",
            "area_hectares": 12.5,
            "status": "em_analise",
            "responsavel_id": null,
            "created_at": "2026-01-10T12:00:00Z"
        });
        let analysis: Analysis = serde_json::from_value(row).unwrap();
        assert_eq!(analysis.client_name, "João Silva");
        assert_eq!(analysis.status, AnalysisStatus::EmAnalise);
        assert_eq!(analysis.crop.as_deref(), Some("soja"));
        assert!(analysis.assignee_id.is_none());
    }

    #[test]
    fn test_draft_sends_empty_optionals_as_null() {
        let draft = MessageDraft {
            name: "Maria".into(),
            email: "maria@exemplo.com".into(),
            phone: None,
            subject: None,
            body: "Olá".into(),
            status: MessageStatus::Pendente,
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["telefone"], serde_json::Value::Null);
        assert_eq!(json["assunto"], serde_json::Value::Null);
        assert_eq!(json["mensagem"], "Olá");
        assert_eq!(json["status"], "pendente");
    }

    #[test]
    fn test_user_display_name_falls_back_to_email() {
        let mut user = User {
            id: "u1".into(),
            email: "tec@sicoop.com".into(),
            full_name: Some("  ".into()),
            role: UserRole::Technician,
            created_at: None,
        };
        assert_eq!(user.display_name(), "tec@sicoop.com");
        user.full_name = Some("Ana Costa".into());
        assert_eq!(user.display_name(), "Ana Costa");
    }

    #[test]
    fn test_processing_response_camel_case() {
        let json = r#"{"success":true,"processedCount":3,"message":"ok"}"#;
        let resp: ProcessingResponse = serde_json::from_str(json).unwrap();
        assert!(resp.success);
        assert_eq!(resp.processed_count, Some(3));
        assert!(resp.error.is_none());

        let out = serde_json::to_value(ProcessingResponse::failed("boom")).unwrap();
        assert_eq!(out, serde_json::json!({"success": false, "error": "boom"}));
    }
}
