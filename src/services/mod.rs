pub mod dispatch;
pub mod email;
pub mod events;
pub mod init;
pub mod recipients;
pub mod templates;
pub mod whatsapp;
