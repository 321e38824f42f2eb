pub mod chat;
pub mod config;
pub mod crm;
pub mod logging;
pub mod notify;
pub mod pagination;

pub use chat::{ChatClient, ChatError, ChatMessage, ChatSession, DecoderState, Role, StreamDecoder};
pub use config::Config;
pub use crm::{CrmClient, CrmError};
pub use notify::{LogNotifier, Notice, NoticeLevel, Notifier};
pub use pagination::{PageSize, Paginator};
