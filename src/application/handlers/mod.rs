//! Application handlers.
//!
//! Command and query handlers, one per boundary operation.

pub mod conversation;
pub mod paging;
pub mod reporting;
pub mod widget;

pub use conversation::{
    AdditionalResponse, ChangeOwnerCommand, ChangeOwnerHandler, ChangeOwnerResult,
    CloseConversationCommand, CloseConversationHandler, CloseConversationResult,
    ConversationDetail, GetConversationHandler, GetConversationQuery, HumanResponseCommand,
    HumanResponseError, HumanResponseHandler, ListActiveHandler, ListActiveQuery, OwnershipError,
    SendMessageCommand, SendMessageError, SendMessageHandler, SendMessageResult,
    SendMessageSettings, SendMessageStatus,
};
pub use paging::{Page, PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use reporting::{
    GetStatisticsHandler, NeedingAttentionHandler, NeedingAttentionQuery,
    SearchConversationsHandler, SearchConversationsQuery, STATS_WINDOW_DAYS,
};
pub use widget::{GetWidgetSettingsHandler, GetWidgetSettingsQuery, WidgetSettings};
