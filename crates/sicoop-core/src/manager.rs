//! Generic remote list manager.
//!
//! One manager per screen collection. It owns the last fetched snapshot, the
//! view filter, the pending-change buffer and (optionally) a page window,
//! and routes every write through the [`MutationDispatcher`] before
//! invalidating its snapshot according to an [`InvalidationPolicy`].
//!
//! Mutations take `&mut self`, so a single manager never has two writes in
//! flight; rows of different managers are independent.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::dispatcher::{ActionKey, MutationDispatcher};
use crate::error::{Error, Result};
use crate::filter::{self, AssigneeFilter, SortOrder, StatusFilter, ViewFilter};
use crate::models::RecordId;
use crate::pagination::{total_pages, PageRequest};
use crate::pending::{PendingChanges, PendingState};
use crate::traits::{ListQuery, Record, RemoteCollection};

/// Fetch lifecycle of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    /// Last fetch failed; the message is shown in place of the table.
    Failed(String),
}

impl LoadState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

/// What happens to the snapshot after a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidationPolicy {
    /// Re-fetch the collection after every write.
    #[default]
    Reload,
    /// Patch status, assignee and deletions into the snapshot; re-fetch
    /// after create and update.
    PatchLocal,
}

/// Current page window of a paginated manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl PageInfo {
    pub fn total_pages(&self) -> u32 {
        total_pages(self.total, self.page_size)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }
}

enum Change<S> {
    Status(RecordId, S),
    Assignee(RecordId, Option<RecordId>),
    Deleted(RecordId),
    Written,
}

pub struct RemoteListManager<R: Record> {
    source: Arc<dyn RemoteCollection<R>>,
    items: Vec<R>,
    state: LoadState,
    filter: ViewFilter<R::Status>,
    pending: PendingChanges<R::Status>,
    dispatcher: MutationDispatcher,
    query: ListQuery,
    page: Option<PageInfo>,
    policy: InvalidationPolicy,
}

impl<R: Record> std::fmt::Debug for RemoteListManager<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteListManager")
            .field("collection", &R::COLLECTION)
            .field("items", &self.items.len())
            .field("state", &self.state)
            .field("pending", &self.pending.len())
            .field("page", &self.page)
            .field("policy", &self.policy)
            .finish()
    }
}

impl<R: Record> RemoteListManager<R> {
    pub fn new(source: Arc<dyn RemoteCollection<R>>) -> Self {
        Self {
            source,
            items: Vec::new(),
            state: LoadState::Idle,
            filter: ViewFilter::default(),
            pending: PendingChanges::new(),
            dispatcher: MutationDispatcher::new(),
            query: ListQuery::newest_first(),
            page: None,
            policy: InvalidationPolicy::Reload,
        }
    }

    /// Server-side query used by every fetch.
    pub fn with_query(mut self, query: ListQuery) -> Self {
        self.query = query;
        self
    }

    /// Serve the list page by page; the search term goes to the server.
    pub fn paginated(mut self, page_size: u32) -> Self {
        let request = PageRequest::new(1, page_size);
        self.page = Some(PageInfo {
            page: request.page,
            page_size: request.page_size,
            total: 0,
        });
        self
    }

    pub fn with_policy(mut self, policy: InvalidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Share a dispatcher with other managers of the same screen.
    pub fn with_dispatcher(mut self, dispatcher: MutationDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.filter.sort = sort;
        self
    }

    // =========================================================================
    // READ
    // =========================================================================

    /// Fetch the snapshot (or the current page).
    ///
    /// On failure the previous snapshot is kept and the state carries the
    /// message.
    pub async fn load(&mut self) -> Result<()> {
        self.state = LoadState::Loading;
        let started = Instant::now();

        let outcome = match self.page {
            Some(info) => self.fetch_page(info).await,
            None => self.source.list(&self.query).await,
        };
        let duration_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(items) => {
                debug!(
                    subsystem = "core",
                    component = "list_manager",
                    op = "load",
                    collection = R::COLLECTION,
                    result_count = items.len(),
                    duration_ms,
                    "Collection loaded"
                );
                self.dispatcher
                    .clear_row_errors(self.items.iter().map(|item| item.id()));
                self.items = items;
                self.pending.retain_ids(self.items.iter().map(|item| item.id()));
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(e) => {
                warn!(
                    subsystem = "core",
                    component = "list_manager",
                    op = "load",
                    collection = R::COLLECTION,
                    duration_ms,
                    error = %e,
                    "Collection load failed"
                );
                self.state = LoadState::Failed(e.user_message());
                Err(e)
            }
        }
    }

    /// Fetch the window in `info`. When the total shrank below it (the last
    /// row of the last page was deleted), fetch the new last page instead.
    async fn fetch_page(&mut self, info: PageInfo) -> Result<Vec<R>> {
        let query = self.query.clone().search(self.filter.term.clone());
        let mut page = self
            .source
            .list_page(&query, PageRequest::new(info.page, info.page_size))
            .await?;
        let last = page.total_pages().max(1);
        if page.page > last {
            debug!(
                subsystem = "core",
                component = "list_manager",
                op = "load",
                collection = R::COLLECTION,
                page = page.page,
                total = page.total,
                "Page past the end, falling back to the last page"
            );
            page = self
                .source
                .list_page(&query, PageRequest::new(last, info.page_size))
                .await?;
        }
        self.page = Some(PageInfo {
            page: page.page,
            page_size: page.page_size,
            total: page.total,
        });
        Ok(page.items)
    }

    /// Rows passing the current filter, in display order.
    pub fn visible(&self) -> Vec<&R> {
        filter::apply(&self.items, &self.filter)
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn get(&self, id: &RecordId) -> Option<&R> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn filter(&self) -> &ViewFilter<R::Status> {
        &self.filter
    }

    pub fn pending(&self) -> &PendingChanges<R::Status> {
        &self.pending
    }

    pub fn dispatcher(&self) -> &MutationDispatcher {
        &self.dispatcher
    }

    pub fn page_info(&self) -> Option<PageInfo> {
        self.page
    }

    pub fn policy(&self) -> InvalidationPolicy {
        self.policy
    }

    /// Whether the row's action control should be disabled.
    pub fn is_row_busy(&self, id: &RecordId) -> bool {
        self.dispatcher.is_busy(&ActionKey::Row(id.clone()))
    }

    // =========================================================================
    // FILTER
    // =========================================================================

    /// Set the free-text term.
    ///
    /// A paginated manager pushes the term to the server and goes back to
    /// the first page; otherwise the change is local.
    pub async fn set_term(&mut self, term: impl Into<String>) -> Result<()> {
        self.filter.term = term.into();
        if let Some(info) = self.page.as_mut() {
            info.page = 1;
            return self.load().await;
        }
        Ok(())
    }

    pub fn set_status_filter(&mut self, status: StatusFilter<R::Status>) {
        self.filter.status = status;
    }

    pub fn set_assignee_filter(&mut self, assignee: AssigneeFilter) {
        self.filter.assignee = assignee;
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.filter.sort = sort;
    }

    /// Clear every predicate; the sort order stays.
    ///
    /// A paginated manager with an active term re-fetches from page 1.
    pub async fn reset_filter(&mut self) -> Result<()> {
        let had_term = !self.filter.term.trim().is_empty();
        let sort = self.filter.sort;
        self.filter = ViewFilter::default().with_sort(sort);
        if had_term {
            if let Some(info) = self.page.as_mut() {
                info.page = 1;
                return self.load().await;
            }
        }
        Ok(())
    }

    // =========================================================================
    // PENDING CHANGES
    // =========================================================================

    /// Stage a status (or role) change for `id` without writing it.
    pub fn propose_status(&mut self, id: &RecordId, status: R::Status) -> Result<()> {
        let committed = self
            .get(id)
            .map(|item| item.status())
            .ok_or_else(|| Error::NotFound(format!("{} {}", R::COLLECTION, id)))?;
        self.pending.propose(id.clone(), status, &committed);
        Ok(())
    }

    /// Discard a staged change. Never touches the remote.
    pub fn cancel(&mut self, id: &RecordId) -> Option<R::Status> {
        self.pending.cancel(id)
    }

    pub fn pending_state(&self, id: &RecordId) -> PendingState<'_, R::Status> {
        self.pending.state(id)
    }

    /// Value the row's selector shows: the staged value, else the committed one.
    pub fn effective_status(&self, id: &RecordId) -> Option<R::Status> {
        let committed = self.get(id)?.status();
        Some(*self.pending.effective(id, &committed))
    }

    /// Write the staged value for `id`.
    ///
    /// Exactly one remote call carries the staged value. On success the
    /// entry is dropped and the snapshot invalidated; on failure the entry
    /// stays pending and the error is returned.
    pub async fn confirm(&mut self, id: &RecordId) -> Result<()> {
        let status = *self
            .pending
            .get(id)
            .ok_or_else(|| Error::InvalidInput(format!("No pending change for {}", id)))?;

        self.dispatcher
            .run(
                ActionKey::Row(id.clone()),
                self.source.set_status(id, status),
            )
            .await?;

        self.pending.commit(id);
        info!(
            subsystem = "core",
            component = "list_manager",
            op = "confirm",
            collection = R::COLLECTION,
            record_id = %id,
            status = %status,
            "Pending change confirmed"
        );
        self.invalidate(Change::Status(id.clone(), status)).await;
        Ok(())
    }

    // =========================================================================
    // MUTATIONS
    // =========================================================================

    /// Change the status immediately, dropping any staged value for the row.
    pub async fn set_status(&mut self, id: &RecordId, status: R::Status) -> Result<()> {
        self.dispatcher
            .run(
                ActionKey::Row(id.clone()),
                self.source.set_status(id, status),
            )
            .await?;

        self.pending.commit(id);
        info!(
            subsystem = "core",
            component = "list_manager",
            op = "set_status",
            collection = R::COLLECTION,
            record_id = %id,
            status = %status,
            "Status changed"
        );
        self.invalidate(Change::Status(id.clone(), status)).await;
        Ok(())
    }

    pub async fn assign(&mut self, id: &RecordId, assignee: Option<RecordId>) -> Result<()> {
        self.dispatcher
            .run(
                ActionKey::Row(id.clone()),
                self.source.assign(id, assignee.clone()),
            )
            .await?;

        info!(
            subsystem = "core",
            component = "list_manager",
            op = "assign",
            collection = R::COLLECTION,
            record_id = %id,
            assignee = assignee.as_ref().map(RecordId::as_str).unwrap_or(""),
            "Row assigned"
        );
        self.invalidate(Change::Assignee(id.clone(), assignee)).await;
        Ok(())
    }

    pub async fn create(&mut self, draft: &R::Draft) -> Result<()> {
        self.dispatcher
            .run(ActionKey::Form, self.source.create(draft))
            .await?;

        info!(
            subsystem = "core",
            component = "list_manager",
            op = "create",
            collection = R::COLLECTION,
            "Row created"
        );
        self.invalidate(Change::Written).await;
        Ok(())
    }

    pub async fn update(&mut self, id: &RecordId, draft: &R::Draft) -> Result<()> {
        self.dispatcher
            .run(ActionKey::Form, self.source.update(id, draft))
            .await?;

        info!(
            subsystem = "core",
            component = "list_manager",
            op = "update",
            collection = R::COLLECTION,
            record_id = %id,
            "Row updated"
        );
        self.invalidate(Change::Written).await;
        Ok(())
    }

    pub async fn delete(&mut self, id: &RecordId) -> Result<()> {
        self.dispatcher
            .run(ActionKey::Row(id.clone()), self.source.delete(id))
            .await?;

        self.pending.cancel(id);
        info!(
            subsystem = "core",
            component = "list_manager",
            op = "delete",
            collection = R::COLLECTION,
            record_id = %id,
            "Row deleted"
        );
        self.invalidate(Change::Deleted(id.clone())).await;
        Ok(())
    }

    // =========================================================================
    // PAGINATION
    // =========================================================================

    /// Jump to `page`, clamped to the known page range.
    pub async fn go_to_page(&mut self, page: u32) -> Result<()> {
        let info = self
            .page
            .as_mut()
            .ok_or_else(|| Error::InvalidInput(format!("{} is not paginated", R::COLLECTION)))?;
        let last = info.total_pages().max(1);
        info.page = page.clamp(1, last);
        debug!(
            subsystem = "core",
            component = "list_manager",
            op = "go_to_page",
            collection = R::COLLECTION,
            page = info.page,
            "Changing page"
        );
        self.load().await
    }

    /// No-op on the last page.
    pub async fn next_page(&mut self) -> Result<()> {
        match self.page {
            Some(info) if info.has_next() => self.go_to_page(info.page + 1).await,
            Some(_) => Ok(()),
            None => self.go_to_page(1).await,
        }
    }

    /// No-op on the first page.
    pub async fn previous_page(&mut self) -> Result<()> {
        match self.page {
            Some(info) if info.has_previous() => self.go_to_page(info.page - 1).await,
            Some(_) => Ok(()),
            None => self.go_to_page(1).await,
        }
    }

    // =========================================================================
    // INVALIDATION
    // =========================================================================

    async fn invalidate(&mut self, change: Change<R::Status>) {
        match (self.policy, change) {
            (InvalidationPolicy::PatchLocal, Change::Status(id, status)) => {
                if let Some(item) = self.items.iter_mut().find(|item| item.id() == &id) {
                    item.set_status(status);
                }
            }
            (InvalidationPolicy::PatchLocal, Change::Assignee(id, assignee)) => {
                if let Some(item) = self.items.iter_mut().find(|item| item.id() == &id) {
                    item.set_assignee(assignee);
                }
            }
            (InvalidationPolicy::PatchLocal, Change::Deleted(id)) => {
                let before = self.items.len();
                self.items.retain(|item| item.id() != &id);
                self.dispatcher.clear_row_errors([&id]);
                if let Some(info) = self.page.as_mut() {
                    info.total = info.total.saturating_sub((before - self.items.len()) as u64);
                    if self.items.is_empty() && info.page > info.total_pages().max(1) {
                        self.refresh().await;
                    }
                }
            }
            _ => self.refresh().await,
        }
    }

    /// Re-fetch after a successful write. A failed reload does not undo the
    /// write: the state shows the fetch error and the mutation still succeeds.
    async fn refresh(&mut self) {
        if let Err(e) = self.load().await {
            warn!(
                subsystem = "core",
                component = "list_manager",
                op = "invalidate",
                collection = R::COLLECTION,
                error = %e,
                "Reload after write failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Analysis, AnalysisStatus, User, UserRole};
    use crate::testing::StubCollection;

    fn analysis(id: &str, name: &str, status: AnalysisStatus) -> Analysis {
        Analysis {
            id: id.into(),
            client_name: name.into(),
            email: format!("{}@exemplo.com", id),
            phone: None,
            property_name: None,
            crop: None,
            latitude: None,
            longitude: None,
            area_hectares: None,
            notes: None,
            status,
            assignee_id: None,
            created_at: None,
        }
    }

    fn user(id: &str, email: &str, role: UserRole) -> User {
        User {
            id: id.into(),
            email: email.into(),
            full_name: None,
            role,
            created_at: None,
        }
    }

    async fn loaded_users(stub: &Arc<StubCollection<User>>) -> RemoteListManager<User> {
        let mut manager = RemoteListManager::new(stub.clone() as Arc<dyn RemoteCollection<User>>);
        manager.load().await.unwrap();
        manager
    }

    #[tokio::test]
    async fn test_load_and_filter() {
        let stub = StubCollection::with_rows(vec![
            analysis("1", "João Silva", AnalysisStatus::Pendente),
            analysis("2", "Maria Santos", AnalysisStatus::EmAnalise),
        ]);
        let mut manager = RemoteListManager::new(stub.clone() as Arc<dyn RemoteCollection<Analysis>>);
        assert_eq!(manager.state(), &LoadState::Idle);

        manager.load().await.unwrap();
        assert_eq!(manager.state(), &LoadState::Ready);
        assert_eq!(manager.visible().len(), 2);

        manager.set_term("João").await.unwrap();
        assert_eq!(manager.visible().len(), 1);

        manager.set_status_filter(StatusFilter::Only(AnalysisStatus::EmAnalise));
        assert!(manager.visible().is_empty());

        manager.reset_filter().await.unwrap();
        assert_eq!(manager.visible().len(), 2);
        // Local filtering never refetches.
        assert_eq!(stub.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_load_failure_sets_failed_state() {
        let stub = StubCollection::<Analysis>::with_rows(vec![]);
        stub.fail_next_list("relation does not exist");
        let mut manager = RemoteListManager::new(stub.clone() as Arc<dyn RemoteCollection<Analysis>>);

        assert!(manager.load().await.is_err());
        assert_eq!(
            manager.state().error(),
            Some("Remote error: relation does not exist")
        );
    }

    #[tokio::test]
    async fn test_confirm_issues_one_call_and_commits() {
        let stub = StubCollection::with_rows(vec![
            user("1", "ana@sicoop.com", UserRole::Client),
            user("2", "bia@sicoop.com", UserRole::Client),
        ]);
        let mut manager = loaded_users(&stub).await;
        let one = RecordId::from("1");
        let two = RecordId::from("2");

        manager.propose_status(&one, UserRole::Technician).unwrap();
        manager.propose_status(&two, UserRole::Admin).unwrap();
        manager.confirm(&one).await.unwrap();

        assert_eq!(
            stub.status_calls(),
            vec![(RecordId::from("1"), UserRole::Technician)]
        );
        assert_eq!(manager.pending_state(&one), PendingState::Committed);
        assert!(manager.pending().is_pending(&two));
        assert_eq!(manager.get(&one).unwrap().role, UserRole::Technician);
    }

    #[tokio::test]
    async fn test_confirm_failure_keeps_pending() {
        let stub = StubCollection::with_rows(vec![user("1", "ana@sicoop.com", UserRole::Client)]);
        let mut manager = loaded_users(&stub).await;
        let one = RecordId::from("1");

        manager.propose_status(&one, UserRole::Admin).unwrap();
        stub.fail_next_write("permission denied for function update_user_role");

        assert!(manager.confirm(&one).await.is_err());
        assert_eq!(manager.pending_state(&one), PendingState::Pending(&UserRole::Admin));
        assert!(manager
            .dispatcher()
            .last_error(&ActionKey::row("1"))
            .is_some());
        assert!(!manager.is_row_busy(&one));
    }

    #[tokio::test]
    async fn test_cancel_never_touches_remote() {
        let stub = StubCollection::with_rows(vec![user("1", "ana@sicoop.com", UserRole::Client)]);
        let mut manager = loaded_users(&stub).await;
        let one = RecordId::from("1");

        manager.propose_status(&one, UserRole::Admin).unwrap();
        assert_eq!(manager.effective_status(&one), Some(UserRole::Admin));
        assert_eq!(manager.cancel(&one), Some(UserRole::Admin));

        assert!(stub.status_calls().is_empty());
        assert_eq!(stub.list_calls(), 1);
        assert_eq!(manager.effective_status(&one), Some(UserRole::Client));
    }

    #[tokio::test]
    async fn test_confirm_without_pending_is_rejected() {
        let stub = StubCollection::with_rows(vec![user("1", "ana@sicoop.com", UserRole::Client)]);
        let mut manager = loaded_users(&stub).await;

        let err = manager.confirm(&"1".into()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(stub.status_calls().is_empty());
    }

    #[tokio::test]
    async fn test_propose_unknown_row() {
        let stub = StubCollection::with_rows(vec![user("1", "ana@sicoop.com", UserRole::Client)]);
        let mut manager = loaded_users(&stub).await;
        assert!(matches!(
            manager.propose_status(&"9".into(), UserRole::Admin),
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_reload_policy_refetches_after_write() {
        let stub = StubCollection::with_rows(vec![analysis("1", "João", AnalysisStatus::Pendente)]);
        let mut manager = RemoteListManager::new(stub.clone() as Arc<dyn RemoteCollection<Analysis>>);
        manager.load().await.unwrap();

        manager
            .set_status(&"1".into(), AnalysisStatus::Concluida)
            .await
            .unwrap();
        assert_eq!(stub.list_calls(), 2);
        assert_eq!(manager.items()[0].status, AnalysisStatus::Concluida);
    }

    #[tokio::test]
    async fn test_patch_local_policy_skips_refetch() {
        let stub = StubCollection::with_rows(vec![
            analysis("1", "João", AnalysisStatus::Pendente),
            analysis("2", "Maria", AnalysisStatus::Pendente),
        ]);
        let mut manager = RemoteListManager::new(stub.clone() as Arc<dyn RemoteCollection<Analysis>>)
            .with_policy(InvalidationPolicy::PatchLocal);
        manager.load().await.unwrap();

        manager
            .assign(&"1".into(), Some("tec-1".into()))
            .await
            .unwrap();
        manager.delete(&"2".into()).await.unwrap();

        assert_eq!(stub.list_calls(), 1);
        assert_eq!(manager.items().len(), 1);
        assert_eq!(
            manager.items()[0].assignee_id.as_ref().map(RecordId::as_str),
            Some("tec-1")
        );
    }

    #[tokio::test]
    async fn test_failed_reload_after_write_still_succeeds() {
        let stub = StubCollection::with_rows(vec![analysis("1", "João", AnalysisStatus::Pendente)]);
        let mut manager = RemoteListManager::new(stub.clone() as Arc<dyn RemoteCollection<Analysis>>);
        manager.load().await.unwrap();

        stub.fail_next_list("connection reset");
        manager
            .set_status(&"1".into(), AnalysisStatus::Cancelada)
            .await
            .unwrap();
        assert!(manager.state().error().is_some());
    }

    #[tokio::test]
    async fn test_pagination_and_server_search() {
        let rows = (1..=23)
            .map(|i| user(&i.to_string(), &format!("user{}@sicoop.com", i), UserRole::Client))
            .collect();
        let stub = StubCollection::with_rows(rows);
        let mut manager = RemoteListManager::new(stub.clone() as Arc<dyn RemoteCollection<User>>)
            .with_query(ListQuery::new())
            .paginated(10);
        manager.load().await.unwrap();

        let info = manager.page_info().unwrap();
        assert_eq!((info.page, info.total, info.total_pages()), (1, 23, 3));
        assert_eq!(manager.items().len(), 10);

        manager.next_page().await.unwrap();
        manager.next_page().await.unwrap();
        assert_eq!(manager.page_info().unwrap().page, 3);
        assert_eq!(manager.items().len(), 3);

        // Already on the last page.
        manager.next_page().await.unwrap();
        assert_eq!(manager.page_info().unwrap().page, 3);

        manager.set_term("user2").await.unwrap();
        let info = manager.page_info().unwrap();
        assert_eq!(info.page, 1);
        assert_eq!(stub.last_query().unwrap().search.as_deref(), Some("user2"));
    }

    #[tokio::test]
    async fn test_create_from_validated_form_reloads() {
        let stub = StubCollection::<Analysis>::with_rows(vec![]);
        let mut manager = RemoteListManager::new(stub.clone() as Arc<dyn RemoteCollection<Analysis>>);
        manager.load().await.unwrap();

        let mut form = crate::validation::AnalysisForm {
            client_name: "João Silva".into(),
            email: "joao@fazenda.com".into(),
            property_name: "Sítio Alegre".into(),
            area: "0".into(),
            ..Default::default()
        };
        // Rejected before anything reaches the store.
        assert!(matches!(form.validate(), Err(Error::Validation(_))));
        assert_eq!(stub.created(), 0);

        form.area = "12.5".into();
        let draft = form.validate().unwrap();
        manager.create(&draft).await.unwrap();

        assert_eq!(stub.created(), 1);
        assert_eq!(stub.list_calls(), 2);
        assert!(!manager.dispatcher().is_busy(&ActionKey::Form));
    }

    fn paged_users(
        count: usize,
        page_size: u32,
    ) -> (Arc<StubCollection<User>>, RemoteListManager<User>) {
        let rows = (1..=count)
            .map(|i| user(&i.to_string(), &format!("user{}@sicoop.com", i), UserRole::Client))
            .collect();
        let stub = StubCollection::with_rows(rows);
        let manager = RemoteListManager::new(stub.clone() as Arc<dyn RemoteCollection<User>>)
            .with_query(ListQuery::new())
            .paginated(page_size);
        (stub, manager)
    }

    #[tokio::test]
    async fn test_update_sends_cleared_fields_and_reloads() {
        let mut stored = analysis("1", "João", AnalysisStatus::EmAnalise);
        stored.phone = Some("11 9999-0000".into());
        stored.property_name = Some("Sítio Alegre".into());
        stored.area_hectares = Some(12.5);
        stored.notes = Some("antiga".into());
        let stub = StubCollection::with_rows(vec![stored]);
        let mut manager = RemoteListManager::new(stub.clone() as Arc<dyn RemoteCollection<Analysis>>);
        manager.load().await.unwrap();

        let id = RecordId::from("1");
        let mut form = crate::validation::AnalysisForm::from_analysis(manager.get(&id).unwrap());
        form.phone.clear();
        form.notes.clear();
        manager.update(&id, &form.validate().unwrap()).await.unwrap();

        let updates = stub.updates();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, id);
        assert_eq!(updates[0].1["telefone"], serde_json::Value::Null);
        assert_eq!(updates[0].1["observacoes"], serde_json::Value::Null);
        assert_eq!(updates[0].1["nome_propriedade"], "Sítio Alegre");
        assert_eq!(stub.list_calls(), 2);
        assert!(!manager.dispatcher().is_busy(&ActionKey::Form));
    }

    #[tokio::test]
    async fn test_update_missing_row_reports_not_found() {
        let stub = StubCollection::with_rows(vec![analysis("1", "João", AnalysisStatus::Pendente)]);
        let mut manager = RemoteListManager::new(stub.clone() as Arc<dyn RemoteCollection<Analysis>>);
        manager.load().await.unwrap();

        let mut form = crate::validation::AnalysisForm::from_analysis(&manager.items()[0]);
        form.property_name = "Sítio".into();
        form.area = "3".into();
        let err = manager
            .update(&"9".into(), &form.validate().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(manager.dispatcher().last_error(&ActionKey::Form).is_some());
        assert_eq!(stub.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_previous_page_walks_back_and_stops_at_first() {
        let (_stub, mut manager) = paged_users(23, 10);
        manager.load().await.unwrap();
        manager.go_to_page(3).await.unwrap();
        assert_eq!(manager.items().len(), 3);

        manager.previous_page().await.unwrap();
        let info = manager.page_info().unwrap();
        assert_eq!(info.page, 2);
        assert_eq!(manager.items()[0].id.as_str(), "11");

        manager.previous_page().await.unwrap();
        manager.previous_page().await.unwrap();
        assert_eq!(manager.page_info().unwrap().page, 1);
        assert_eq!(manager.items()[0].id.as_str(), "1");
    }

    #[tokio::test]
    async fn test_deleting_last_row_of_last_page_moves_back() {
        let (stub, mut manager) = paged_users(21, 10);
        manager.load().await.unwrap();
        manager.go_to_page(3).await.unwrap();
        assert_eq!(manager.items().len(), 1);

        manager.delete(&"21".into()).await.unwrap();

        let info = manager.page_info().unwrap();
        assert_eq!((info.page, info.total, info.total_pages()), (2, 20, 2));
        assert_eq!(manager.items().len(), 10);
        assert_eq!(manager.items()[9].id.as_str(), "20");
        assert_eq!(stub.list_calls(), 4);
    }

    #[tokio::test]
    async fn test_patch_local_delete_emptying_last_page_refetches() {
        let (stub, manager) = paged_users(21, 10);
        let mut manager = manager.with_policy(InvalidationPolicy::PatchLocal);
        manager.load().await.unwrap();
        manager.go_to_page(3).await.unwrap();
        let calls = stub.list_calls();

        manager.delete(&"21".into()).await.unwrap();

        assert_eq!(manager.page_info().unwrap().page, 2);
        assert_eq!(manager.items().len(), 10);
        assert!(stub.list_calls() > calls);
    }

    #[tokio::test]
    async fn test_load_clears_row_errors_of_previous_snapshot() {
        let stub = StubCollection::with_rows(vec![analysis("1", "João", AnalysisStatus::Pendente)]);
        let mut manager = RemoteListManager::new(stub.clone() as Arc<dyn RemoteCollection<Analysis>>);
        manager.load().await.unwrap();

        stub.fail_next_write("timeout");
        assert!(manager.delete(&"1".into()).await.is_err());
        assert!(manager.dispatcher().last_error(&ActionKey::row("1")).is_some());

        manager.load().await.unwrap();
        assert!(manager.dispatcher().last_error(&ActionKey::row("1")).is_none());
    }

    #[tokio::test]
    async fn test_go_to_page_requires_pagination() {
        let stub = StubCollection::with_rows(vec![analysis("1", "João", AnalysisStatus::Pendente)]);
        let mut manager = RemoteListManager::new(stub as Arc<dyn RemoteCollection<Analysis>>);
        assert!(matches!(
            manager.go_to_page(2).await,
            Err(Error::InvalidInput(_))
        ));
    }
}
