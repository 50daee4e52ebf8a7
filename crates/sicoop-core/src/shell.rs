//! Application shell: role capabilities, navigation and toasts.
//!
//! Navigation checks the session's capabilities before anything else; a
//! screen the role cannot manage renders the access-denied block and loads
//! nothing.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::models::{RecordId, UserRole};
use crate::screens::{
    AnalysesScreen, AuthorizationsScreen, MessagesScreen, NotificationsScreen, UsersScreen,
};
use crate::toast::ToastQueue;
use crate::traits::{CollectionProvider, NotificationProcessor};

/// Something a role is allowed to manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ManageAnalyses,
    ManageMessages,
    ManageUsers,
    ManageAuthorizations,
    ManageNotifications,
}

impl UserRole {
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            UserRole::Admin => &[
                Capability::ManageAnalyses,
                Capability::ManageMessages,
                Capability::ManageUsers,
                Capability::ManageAuthorizations,
                Capability::ManageNotifications,
            ],
            UserRole::Technician => &[Capability::ManageAnalyses, Capability::ManageMessages],
            UserRole::Client => &[],
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// Signed-in user as seen by the shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: RecordId,
    pub email: String,
    pub role: UserRole,
}

impl Session {
    pub fn new(user_id: impl Into<RecordId>, email: impl Into<String>, role: UserRole) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
            role,
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.role.can(capability)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Analyses,
    Messages,
    Users,
    Authorizations,
    Notifications,
}

impl Screen {
    pub const ALL: [Screen; 5] = [
        Self::Analyses,
        Self::Messages,
        Self::Users,
        Self::Authorizations,
        Self::Notifications,
    ];

    pub fn required_capability(&self) -> Capability {
        match self {
            Self::Analyses => Capability::ManageAnalyses,
            Self::Messages => Capability::ManageMessages,
            Self::Users => Capability::ManageUsers,
            Self::Authorizations => Capability::ManageAuthorizations,
            Self::Notifications => Capability::ManageNotifications,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Analyses => "Análises",
            Self::Messages => "Mensagens",
            Self::Users => "Usuários",
            Self::Authorizations => "Autorizações",
            Self::Notifications => "Notificações",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::Analyses => "/admin/analises",
            Self::Messages => "/admin/mensagens",
            Self::Users => "/admin/usuarios",
            Self::Authorizations => "/admin/autorizacoes",
            Self::Notifications => "/admin/notificacoes",
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            Self::Analyses => "analyses",
            Self::Messages => "messages",
            Self::Users => "users",
            Self::Authorizations => "authorizations",
            Self::Notifications => "notifications",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub screen: Screen,
    pub title: &'static str,
    pub path: &'static str,
}

/// Menu entries the role may open, in display order.
pub fn menu(role: UserRole) -> Vec<MenuEntry> {
    Screen::ALL
        .iter()
        .filter(|screen| role.can(screen.required_capability()))
        .map(|&screen| MenuEntry {
            screen,
            title: screen.title(),
            path: screen.path(),
        })
        .collect()
}

/// What the content area currently renders.
pub enum ScreenView {
    Home,
    AccessDenied { screen: Screen, message: String },
    Analyses(AnalysesScreen),
    Messages(MessagesScreen),
    Users(UsersScreen),
    Authorizations(AuthorizationsScreen),
    Notifications(NotificationsScreen),
}

impl ScreenView {
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }

    pub fn screen(&self) -> Option<Screen> {
        match self {
            Self::Home => None,
            Self::AccessDenied { screen, .. } => Some(*screen),
            Self::Analyses(_) => Some(Screen::Analyses),
            Self::Messages(_) => Some(Screen::Messages),
            Self::Users(_) => Some(Screen::Users),
            Self::Authorizations(_) => Some(Screen::Authorizations),
            Self::Notifications(_) => Some(Screen::Notifications),
        }
    }
}

pub struct AppShell<P: CollectionProvider> {
    provider: Arc<P>,
    session: Session,
    processor: Option<Arc<dyn NotificationProcessor>>,
    view: ScreenView,
    toasts: ToastQueue,
}

impl<P: CollectionProvider> AppShell<P> {
    pub fn new(provider: Arc<P>, session: Session) -> Self {
        Self {
            provider,
            session,
            processor: None,
            view: ScreenView::Home,
            toasts: ToastQueue::default(),
        }
    }

    pub fn with_processor(mut self, processor: Arc<dyn NotificationProcessor>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn menu(&self) -> Vec<MenuEntry> {
        menu(self.session.role)
    }

    pub fn view(&self) -> &ScreenView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ScreenView {
        &mut self.view
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    /// Open `screen` with a fresh filter and a fresh fetch.
    ///
    /// Without the capability the view becomes [`ScreenView::AccessDenied`]
    /// and nothing is fetched. A failed fetch leaves the screen open in its
    /// failed state and raises an error toast.
    pub async fn navigate(&mut self, screen: Screen) -> Result<()> {
        if !self.session.can(screen.required_capability()) {
            let err = Error::Forbidden(format!(
                "Acesso negado: o perfil {} não pode acessar {}",
                self.session.role.label(),
                screen.title()
            ));
            warn!(
                subsystem = "core",
                component = "shell",
                screen = screen.slug(),
                role = %self.session.role,
                "Navigation denied"
            );
            self.view = ScreenView::AccessDenied {
                screen,
                message: err.user_message(),
            };
            return Err(err);
        }

        info!(
            subsystem = "core",
            component = "shell",
            screen = screen.slug(),
            role = %self.session.role,
            "Navigating"
        );
        let provider = self.provider.as_ref();
        let (view, loaded) = match screen {
            Screen::Analyses => {
                let mut s = AnalysesScreen::new(provider);
                let loaded = s.load().await;
                (ScreenView::Analyses(s), loaded)
            }
            Screen::Messages => {
                let mut s = MessagesScreen::new(provider);
                let loaded = s.load().await;
                (ScreenView::Messages(s), loaded)
            }
            Screen::Users => {
                let mut s = UsersScreen::new(provider);
                let loaded = s.load().await;
                (ScreenView::Users(s), loaded)
            }
            Screen::Authorizations => {
                let mut s = AuthorizationsScreen::new(provider);
                let loaded = s.load().await;
                (ScreenView::Authorizations(s), loaded)
            }
            Screen::Notifications => {
                let mut s = NotificationsScreen::new(provider);
                let loaded = s.load().await;
                (ScreenView::Notifications(s), loaded)
            }
        };
        self.view = view;
        if let Err(e) = &loaded {
            self.toasts.error(e);
        }
        loaded
    }

    /// Toast the outcome of a screen action and hand it back.
    pub fn report<T>(&mut self, outcome: Result<T>, success: &str) -> Result<T> {
        match &outcome {
            Ok(_) => self.toasts.success(success),
            Err(e) => self.toasts.error(e),
        }
        outcome
    }

    /// Run the "process pending" action of the notifications screen.
    pub async fn process_pending_notifications(&mut self) -> Result<()> {
        let processor = self
            .processor
            .clone()
            .ok_or_else(|| Error::Config("Notification processing endpoint not configured".into()))?;
        let ScreenView::Notifications(screen) = &mut self.view else {
            return Err(Error::InvalidInput(
                "Notifications screen is not open".into(),
            ));
        };

        let outcome = screen.process_pending(processor.as_ref()).await;
        match outcome {
            Ok(response) => {
                let message = response.message.unwrap_or_else(|| {
                    format!(
                        "{} notificações processadas",
                        response.processed_count.unwrap_or(0)
                    )
                });
                self.toasts.success(message);
                Ok(())
            }
            Err(e) => {
                self.toasts.error(&e);
                Err(e)
            }
        }
    }
}
