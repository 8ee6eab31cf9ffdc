//! Visitor widget queries.

mod get_settings;

pub use get_settings::{GetWidgetSettingsHandler, GetWidgetSettingsQuery, WidgetSettings};
