pub mod settings;
pub mod sync;
pub mod transfer;
pub mod watch;
pub mod words;
