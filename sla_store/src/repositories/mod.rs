pub mod alert;
pub mod chat;
pub mod classification_cache;
pub mod faq;
pub mod feedback;
pub mod invitation;
pub mod message;
pub mod request;
pub mod settings;

pub use alert::PgAlertRepository;
pub use chat::{migrate_chat, PgChatRepository};
pub use classification_cache::PgClassificationCacheRepository;
pub use faq::PgFaqRepository;
pub use feedback::PgFeedbackRepository;
pub use invitation::PgInvitationRepository;
pub use message::PgMessageRepository;
pub use request::PgRequestRepository;
pub use settings::PgSettingsRepository;
