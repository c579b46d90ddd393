/// Business logic layer
///
/// - `auth`: password hashing, session cookies, OTPs, OTP rate limiting
/// - `email`: SMTP mailer for OTP delivery
/// - `media`: uploads to the hosted media service
/// - `ai`: generative-AI client used by search
/// - `recommendation`: keyword-based feed
/// - `search`: AI-assisted keyword and category search
pub mod ai;
pub mod auth;
pub mod email;
pub mod media;
pub mod recommendation;
pub mod search;

pub use ai::LanguageModel;
pub use email::EmailService;
pub use media::{MediaStorage, ResourceKind, UploadedAsset, UploadedFile};
