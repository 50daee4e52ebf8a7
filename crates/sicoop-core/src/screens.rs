//! Back-office screens.
//!
//! Each screen composes one or more [`RemoteListManager`]s with the lookup
//! collections its table needs. A screen is built fresh on every
//! navigation, so filters and snapshots never leak between visits.

use std::sync::Arc;

use tracing::{info, warn};

use crate::defaults;
use crate::dispatcher::{ActionKey, MutationDispatcher};
use crate::error::{Error, Result};
use crate::lookup::LabelLookup;
use crate::manager::{InvalidationPolicy, RemoteListManager};
use crate::models::{
    Analysis, Message, NotificationCategory, NotificationLog, NotificationSetting,
    ProcessingResponse, RecordId, Role, User, UserRole,
};
use crate::traits::{CollectionProvider, ListQuery, NotificationProcessor, RemoteCollection};

// =============================================================================
// ANALYSES
// =============================================================================

/// Soil-analysis requests, assignable to technicians.
pub struct AnalysesScreen {
    pub analyses: RemoteListManager<Analysis>,
    users: Arc<dyn RemoteCollection<User>>,
    technicians: LabelLookup,
}

impl AnalysesScreen {
    pub fn new<P: CollectionProvider>(provider: &P) -> Self {
        Self {
            analyses: RemoteListManager::new(provider.collection::<Analysis>()),
            users: provider.collection::<User>(),
            technicians: LabelLookup::new(),
        }
    }

    /// Fetch the analyses and the technician lookup.
    ///
    /// A failed lookup leaves assignees shown by raw id.
    pub async fn load(&mut self) -> Result<()> {
        let query = ListQuery::new()
            .eq("role", UserRole::Technician)
            .order_by("full_name", true);
        let (lookup, loaded) = futures::join!(self.users.list(&query), self.analyses.load());
        match lookup {
            Ok(users) => self.technicians = LabelLookup::from_records(&users),
            Err(e) => warn!(
                subsystem = "core",
                component = "screens",
                screen = "analyses",
                error = %e,
                "Technician lookup failed"
            ),
        }
        loaded
    }

    pub fn technicians(&self) -> &LabelLookup {
        &self.technicians
    }

    /// Assignee column text for a row.
    pub fn assignee_label<'a>(&'a self, analysis: &'a Analysis) -> &'a str {
        self.technicians.resolve(analysis.assignee_id.as_ref())
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

/// Contact-form messages.
pub struct MessagesScreen {
    pub messages: RemoteListManager<Message>,
    users: Arc<dyn RemoteCollection<User>>,
    staff: LabelLookup,
}

impl MessagesScreen {
    pub fn new<P: CollectionProvider>(provider: &P) -> Self {
        Self {
            messages: RemoteListManager::new(provider.collection::<Message>())
                .with_policy(InvalidationPolicy::PatchLocal),
            users: provider.collection::<User>(),
            staff: LabelLookup::new(),
        }
    }

    pub async fn load(&mut self) -> Result<()> {
        let query = ListQuery::new();
        let (lookup, loaded) = futures::join!(self.users.list(&query), self.messages.load());
        match lookup {
            Ok(users) => {
                let staff: Vec<User> = users
                    .into_iter()
                    .filter(|u| u.role != UserRole::Client)
                    .collect();
                self.staff = LabelLookup::from_records(&staff);
            }
            Err(e) => warn!(
                subsystem = "core",
                component = "screens",
                screen = "messages",
                error = %e,
                "Staff lookup failed"
            ),
        }
        loaded
    }

    pub fn staff(&self) -> &LabelLookup {
        &self.staff
    }

    pub fn assignee_label<'a>(&'a self, message: &'a Message) -> &'a str {
        self.staff.resolve(message.assignee_id.as_ref())
    }
}

// =============================================================================
// USERS
// =============================================================================

/// Paginated user directory; search runs server-side.
#[derive(Debug)]
pub struct UsersScreen {
    pub users: RemoteListManager<User>,
}

impl UsersScreen {
    pub fn new<P: CollectionProvider>(provider: &P) -> Self {
        Self {
            users: RemoteListManager::new(provider.collection::<User>())
                .paginated(defaults::USER_PAGE_SIZE),
        }
    }

    pub async fn load(&mut self) -> Result<()> {
        self.users.load().await
    }
}

// =============================================================================
// AUTHORIZATIONS
// =============================================================================

/// Role assignment. Role changes are staged per user and written only on
/// explicit confirmation.
#[derive(Debug)]
pub struct AuthorizationsScreen {
    pub users: RemoteListManager<User>,
    pub roles: RemoteListManager<Role>,
}

impl AuthorizationsScreen {
    pub fn new<P: CollectionProvider>(provider: &P) -> Self {
        let dispatcher = MutationDispatcher::new();
        Self {
            users: RemoteListManager::new(provider.collection::<User>())
                .with_dispatcher(dispatcher.clone()),
            roles: RemoteListManager::new(provider.collection::<Role>())
                .with_query(ListQuery::new().order_by("name", true))
                .with_dispatcher(dispatcher),
        }
    }

    pub async fn load(&mut self) -> Result<()> {
        if let Err(e) = self.roles.load().await {
            warn!(
                subsystem = "core",
                component = "screens",
                screen = "authorizations",
                error = %e,
                "Role descriptions unavailable"
            );
        }
        self.users.load().await
    }

    pub fn propose_role(&mut self, user_id: &RecordId, role: UserRole) -> Result<()> {
        self.users.propose_status(user_id, role)
    }

    pub fn cancel(&mut self, user_id: &RecordId) -> Option<UserRole> {
        self.users.cancel(user_id)
    }

    pub async fn confirm(&mut self, user_id: &RecordId) -> Result<()> {
        self.users.confirm(user_id).await
    }

    /// Description of a role from the roles table, falling back to its label.
    pub fn role_description(&self, role: UserRole) -> &str {
        self.roles
            .items()
            .iter()
            .find(|r| r.name == role)
            .and_then(|r| r.description.as_deref())
            .unwrap_or(role.label())
    }
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationTab {
    #[default]
    Categories,
    Settings,
    Logs,
}

impl NotificationTab {
    pub const ALL: [NotificationTab; 3] = [Self::Categories, Self::Settings, Self::Logs];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Categories => "Categorias",
            Self::Settings => "Configurações",
            Self::Logs => "Histórico",
        }
    }
}

/// Key of the screen-wide "process pending" action.
pub const PROCESS_PENDING_ACTION: &str = "process_pending_notifications";

/// Notification categories, per-user settings and the delivery log.
pub struct NotificationsScreen {
    tab: NotificationTab,
    pub categories: RemoteListManager<NotificationCategory>,
    pub settings: RemoteListManager<NotificationSetting>,
    pub logs: RemoteListManager<NotificationLog>,
    users: Arc<dyn RemoteCollection<User>>,
    user_labels: LabelLookup,
    category_labels: LabelLookup,
    dispatcher: MutationDispatcher,
}

impl NotificationsScreen {
    pub fn new<P: CollectionProvider>(provider: &P) -> Self {
        let dispatcher = MutationDispatcher::new();
        Self {
            tab: NotificationTab::default(),
            categories: RemoteListManager::new(provider.collection::<NotificationCategory>())
                .with_dispatcher(dispatcher.clone()),
            settings: RemoteListManager::new(provider.collection::<NotificationSetting>())
                .with_policy(InvalidationPolicy::PatchLocal)
                .with_dispatcher(dispatcher.clone()),
            logs: RemoteListManager::new(provider.collection::<NotificationLog>())
                .with_dispatcher(dispatcher.clone()),
            users: provider.collection::<User>(),
            user_labels: LabelLookup::new(),
            category_labels: LabelLookup::new(),
            dispatcher,
        }
    }

    pub fn tab(&self) -> NotificationTab {
        self.tab
    }

    /// Load the active tab together with the labels its rows reference.
    pub async fn load(&mut self) -> Result<()> {
        match self.tab {
            NotificationTab::Categories => self.categories.load().await,
            NotificationTab::Settings | NotificationTab::Logs => {
                self.refresh_lookups().await;
                if self.tab == NotificationTab::Settings {
                    self.settings.load().await
                } else {
                    self.logs.load().await
                }
            }
        }
    }

    /// Switch tab with a fresh filter and a fresh fetch.
    pub async fn switch_tab(&mut self, tab: NotificationTab) -> Result<()> {
        self.tab = tab;
        match tab {
            NotificationTab::Categories => self.categories.reset_filter().await?,
            NotificationTab::Settings => self.settings.reset_filter().await?,
            NotificationTab::Logs => self.logs.reset_filter().await?,
        }
        self.load().await
    }

    async fn refresh_lookups(&mut self) {
        match self.users.list(&ListQuery::new()).await {
            Ok(users) => self.user_labels = LabelLookup::from_records(&users),
            Err(e) => warn!(
                subsystem = "core",
                component = "screens",
                screen = "notifications",
                error = %e,
                "User lookup failed"
            ),
        }
        if let Err(e) = self.categories.load().await {
            warn!(
                subsystem = "core",
                component = "screens",
                screen = "notifications",
                error = %e,
                "Category lookup failed"
            );
        }
        self.category_labels = LabelLookup::from_records(self.categories.items());
    }

    pub fn user_label<'a>(&'a self, id: Option<&'a RecordId>) -> &'a str {
        self.user_labels.resolve(id)
    }

    pub fn category_label<'a>(&'a self, id: Option<&'a RecordId>) -> &'a str {
        self.category_labels.resolve(id)
    }

    pub fn is_processing(&self) -> bool {
        self.dispatcher.is_busy(&ActionKey::named(PROCESS_PENDING_ACTION))
    }

    /// Run one batch of pending deliveries, then refresh the log.
    ///
    /// A response with `success: false` is an error carrying its message.
    pub async fn process_pending(
        &mut self,
        processor: &dyn NotificationProcessor,
    ) -> Result<ProcessingResponse> {
        let response = self
            .dispatcher
            .run(ActionKey::named(PROCESS_PENDING_ACTION), async {
                let response = processor.process_pending().await?;
                if !response.success {
                    return Err(Error::Remote(
                        response
                            .error
                            .clone()
                            .unwrap_or_else(|| "Notification processing failed".to_string()),
                    ));
                }
                Ok(response)
            })
            .await?;

        info!(
            subsystem = "core",
            component = "screens",
            screen = "notifications",
            processed_count = response.processed_count.unwrap_or(0),
            "Pending notifications processed"
        );
        if self.tab == NotificationTab::Logs {
            if let Err(e) = self.logs.load().await {
                warn!(
                    subsystem = "core",
                    component = "screens",
                    screen = "notifications",
                    error = %e,
                    "Log reload after processing failed"
                );
            }
        }
        Ok(response)
    }
}
