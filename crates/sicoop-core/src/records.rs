//! [`Record`] bindings of every collection the back-office manages.

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

use crate::defaults;
use crate::models::*;
use crate::traits::{Labeled, Record, StatusProcedure};

impl Record for Analysis {
    type Status = AnalysisStatus;
    type Draft = AnalysisDraft;

    const COLLECTION: &'static str = "analises";
    const STATUS_FIELD: &'static str = "status";
    const ASSIGNEE_FIELD: Option<&'static str> = Some("responsavel_id");
    const SEARCH_COLUMNS: &'static [&'static str] = &["nome", "email", "nome_propriedade"];

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.client_name.as_str(), self.email.as_str(), self.id.as_str()];
        fields.extend(self.property_name.as_deref());
        fields.extend(self.crop.as_deref());
        fields
    }

    fn status(&self) -> AnalysisStatus {
        self.status
    }

    fn set_status(&mut self, status: AnalysisStatus) {
        self.status = status;
    }

    fn assignee(&self) -> Option<&RecordId> {
        self.assignee_id.as_ref()
    }

    fn set_assignee(&mut self, assignee: Option<RecordId>) {
        self.assignee_id = assignee;
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl Record for Message {
    type Status = MessageStatus;
    type Draft = MessageDraft;

    const COLLECTION: &'static str = "mensagens";
    const STATUS_FIELD: &'static str = "status";
    const ASSIGNEE_FIELD: Option<&'static str> = Some("atribuido_a");
    const SEARCH_COLUMNS: &'static [&'static str] = &["nome", "email", "assunto"];

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.email.as_str(), self.body.as_str()];
        fields.extend(self.subject.as_deref());
        fields
    }

    fn status(&self) -> MessageStatus {
        self.status
    }

    fn set_status(&mut self, status: MessageStatus) {
        self.status = status;
    }

    fn assignee(&self) -> Option<&RecordId> {
        self.assignee_id.as_ref()
    }

    fn set_assignee(&mut self, assignee: Option<RecordId>) {
        self.assignee_id = assignee;
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl Record for User {
    type Status = UserRole;
    type Draft = UserDraft;

    const COLLECTION: &'static str = "profiles";
    const STATUS_FIELD: &'static str = "role";
    const STATUS_PROCEDURE: Option<StatusProcedure> = Some(StatusProcedure {
        function: defaults::ROLE_UPDATE_FUNCTION,
        id_arg: "user_id",
        value_arg: "new_role",
    });
    const SEARCH_COLUMNS: &'static [&'static str] = &["email", "full_name"];

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.email.as_str()];
        fields.extend(self.full_name.as_deref());
        fields
    }

    fn status(&self) -> UserRole {
        self.role
    }

    fn set_status(&mut self, role: UserRole) {
        self.role = role;
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

impl Labeled for User {
    fn label(&self) -> String {
        self.display_name().to_string()
    }
}

impl Record for Role {
    type Status = UserRole;
    type Draft = RoleDraft;

    const COLLECTION: &'static str = "roles";
    const STATUS_FIELD: &'static str = "name";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.name.label()];
        fields.extend(self.description.as_deref());
        fields
    }

    fn status(&self) -> UserRole {
        self.name
    }

    fn set_status(&mut self, role: UserRole) {
        self.name = role;
    }
}

impl Labeled for Role {
    fn label(&self) -> String {
        self.name.label().to_string()
    }
}

impl Record for NotificationCategory {
    type Status = ActiveState;
    type Draft = NotificationCategoryDraft;

    const COLLECTION: &'static str = "notification_categories";
    const STATUS_FIELD: &'static str = "is_active";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str(), self.display_name.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }

    fn status(&self) -> ActiveState {
        ActiveState::from_flag(self.is_active)
    }

    fn set_status(&mut self, state: ActiveState) {
        self.is_active = state.is_active();
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn status_value(state: ActiveState) -> JsonValue {
        JsonValue::Bool(state.is_active())
    }
}

impl Labeled for NotificationCategory {
    fn label(&self) -> String {
        self.display_name.clone()
    }
}

impl Record for NotificationSetting {
    type Status = ActiveState;
    type Draft = NotificationSettingDraft;

    const COLLECTION: &'static str = "notification_settings";
    const STATUS_FIELD: &'static str = "email_enabled";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.user_id.as_str(), self.category_id.as_str()]
    }

    fn status(&self) -> ActiveState {
        ActiveState::from_flag(self.email_enabled)
    }

    fn set_status(&mut self, state: ActiveState) {
        self.email_enabled = state.is_active();
    }

    fn assignee(&self) -> Option<&RecordId> {
        Some(&self.user_id)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn status_value(state: ActiveState) -> JsonValue {
        JsonValue::Bool(state.is_active())
    }
}

impl Record for NotificationLog {
    type Status = NotificationLogStatus;
    type Draft = NotificationLogDraft;

    const COLLECTION: &'static str = "notification_logs";
    const STATUS_FIELD: &'static str = "status";
    const SEARCH_COLUMNS: &'static [&'static str] = &["email", "subject"];

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.email.as_str(), self.subject.as_str()];
        fields.extend(self.error_message.as_deref());
        fields
    }

    fn status(&self) -> NotificationLogStatus {
        self.status
    }

    fn set_status(&mut self, status: NotificationLogStatus) {
        self.status = status;
    }

    fn assignee(&self) -> Option<&RecordId> {
        self.user_id.as_ref()
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}
