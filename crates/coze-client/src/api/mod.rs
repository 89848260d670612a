//! API endpoint implementations.

mod chat;
mod conversations;
mod datasets;
mod documents;
mod messages;

pub use chat::ChatApi;
pub use conversations::ConversationsApi;
pub use datasets::DatasetsApi;
pub use documents::DocumentsApi;
pub use messages::MessagesApi;
