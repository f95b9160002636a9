pub mod email;

pub use email::{EmailSender, MailSettings};
