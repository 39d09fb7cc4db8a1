pub mod edit_session;
pub mod sync;
pub mod view_session;
