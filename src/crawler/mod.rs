pub mod fetcher;
pub mod orchestrator;
pub mod page;
pub mod traits;

#[cfg(test)]
mod mock;

pub use fetcher::RemoteSessionFactory;
pub use orchestrator::{Delivery, Orchestrator, deliver};
pub use page::PageTimeouts;
