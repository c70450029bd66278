pub mod alert;
pub mod chat;
pub mod classification;
pub mod event;
pub mod faq;
pub mod feedback;
pub mod invitation;
pub mod message;
pub mod request;
pub mod settings;
pub mod timer_job;

pub use alert::{Alert, AlertType, DeliveryStatus, ResolvedAction};
pub use chat::{Chat, ChatType, ClientTier};
pub use classification::ClassificationCacheEntry;
pub use event::{ChatEvent, ChatEventType, ChatRef, FromRef, MemberUpdateKind};
pub use faq::FaqItem;
pub use feedback::FeedbackResponse;
pub use invitation::ChatInvitation;
pub use message::ChatMessage;
pub use request::{Classification, Request, RequestStatus};
pub use settings::GlobalSettings;
pub use timer_job::{timer_id, TimerJob, TimerJobType, TimerPayload};
