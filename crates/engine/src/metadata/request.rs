//! Metadata memory requests.

use std::collections::VecDeque;

/// Kind of a metadata memory request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RequestKind {
    /// Read-fill of a metadata line that missed.
    Fill,
    /// Write-back of a dirty metadata line that was evicted.
    WriteBack,
}

/// A metadata access to the backing store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MetadataRequest {
    /// Fill or write-back.
    pub kind: RequestKind,
    /// Address in the metadata region of backing memory.
    pub addr: u64,
    /// Bytes to transfer.
    pub size: usize,
}

/// Fill and write-back queues of one cache.
///
/// Write-backs are drained before fills so an evicted line reaches memory
/// before its replacement is read.
#[derive(Clone, Debug, Default)]
pub struct RequestQueues {
    fills: VecDeque<MetadataRequest>,
    writebacks: VecDeque<MetadataRequest>,
}

impl RequestQueues {
    /// Queues a request.
    pub fn push(&mut self, request: MetadataRequest) {
        match request.kind {
            RequestKind::Fill => self.fills.push_back(request),
            RequestKind::WriteBack => self.writebacks.push_back(request),
        }
    }

    /// Takes the next request, write-backs first.
    pub fn pop(&mut self) -> Option<MetadataRequest> {
        self.writebacks.pop_front().or_else(|| self.fills.pop_front())
    }

    /// Returns the number of queued fills.
    pub fn fills(&self) -> usize {
        self.fills.len()
    }

    /// Returns the number of queued write-backs.
    pub fn writebacks(&self) -> usize {
        self.writebacks.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.fills.is_empty() && self.writebacks.is_empty()
    }
}
