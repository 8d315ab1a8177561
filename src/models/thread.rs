// file: src/models/thread.rs
// description: serialized thread listing returned to clients
// reference: internal data structures

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadEntry {
    pub title: String,
    pub category: String,
    pub articles: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadsResponse {
    pub threads: Vec<ThreadEntry>,
}

impl From<&[ThreadEntry]> for ThreadsResponse {
    fn from(threads: &[ThreadEntry]) -> Self {
        Self {
            threads: threads.to_vec(),
        }
    }
}
