// Adapters layer: concrete implementations of the domain ports.

pub mod http;
pub mod revision;
pub mod store;

pub use http::{HttpDraftService, HttpExpansionService};
pub use revision::{FileRevisionChannel, StreamRevisionChannel};
pub use store::LocalRecordStore;
