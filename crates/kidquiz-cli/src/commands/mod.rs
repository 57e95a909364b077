pub mod assess;
pub mod edit;
pub mod init;
pub mod list;
pub mod play;
pub mod say;
pub mod validate;
