//! Data connectors.

mod in_memory_directory;
mod search;
mod static_connector;

#[cfg(test)]
mod search_test;

pub use in_memory_directory::InMemoryDirectory;
pub use search::{
  ExecutableSearch, SearchBuilder, SearchDataConnector, SearchEntry, SearchExecutor,
  TemplatedSearchBuilder, escape_filter_value,
};
pub use static_connector::StaticDataConnector;
