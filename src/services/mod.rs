pub mod auth;
pub mod conversations;
pub mod email;
pub mod groups;
pub mod media;
pub mod messages;
pub mod notify;
pub mod push;
pub mod users;
