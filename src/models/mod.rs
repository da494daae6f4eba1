pub mod conversation;
pub mod group;
pub mod message;
pub mod otp;
pub mod user;

pub use conversation::Conversation;
pub use group::Group;
pub use message::{Message, MessageKind};
pub use otp::OtpRecord;
pub use user::{User, UserSummary};
