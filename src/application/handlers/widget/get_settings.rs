//! Widget settings query handler.
//!
//! Returns what the widget needs to render before the first message,
//! with the greeting personalized for known visitors.

use std::sync::Arc;

use serde::Serialize;

use crate::config::ChatConfig;
use crate::domain::conversation::welcome_message;
use crate::ports::VisitorDirectory;

#[derive(Debug, Clone, Default)]
pub struct GetWidgetSettingsQuery {
    pub owner_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSettings {
    pub enabled: bool,
    pub title: String,
    pub theme_color: String,
    pub welcome_message: String,
    pub human_takeover_enabled: bool,
}

pub struct GetWidgetSettingsHandler {
    chat: ChatConfig,
    directory: Option<Arc<dyn VisitorDirectory>>,
}

impl GetWidgetSettingsHandler {
    pub fn new(chat: ChatConfig) -> Self {
        Self {
            chat,
            directory: None,
        }
    }

    pub fn with_visitor_directory(mut self, directory: Arc<dyn VisitorDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Never fails; a failed profile lookup falls back to the guest greeting.
    pub async fn handle(&self, query: GetWidgetSettingsQuery) -> WidgetSettings {
        let profile = match (&self.directory, query.owner_ref.as_deref()) {
            (Some(directory), Some(owner_ref)) => match directory.profile(owner_ref).await {
                Ok(profile) => profile,
                Err(e) => {
                    tracing::warn!(owner_ref, error = %e, "Visitor profile lookup failed");
                    None
                }
            },
            _ => None,
        };

        WidgetSettings {
            enabled: self.chat.enabled,
            title: self.chat.title.clone(),
            theme_color: self.chat.theme_color.clone(),
            welcome_message: welcome_message(
                &self.chat.welcome_message_guest,
                &self.chat.welcome_message_known,
                profile.as_ref(),
            ),
            human_takeover_enabled: self.chat.human_takeover_enabled,
        }
    }
}
