pub mod conversation_store;
pub mod use_case_store;

pub use conversation_store::{ConversationSink, ConversationStore};
pub use use_case_store::UseCaseStore;
