//! Module `state`
//!
//! Per-connection bookkeeping for a client session.

use std::net::SocketAddr;
use std::time::Instant;

/// State of a connected client.
///
/// Only used for accounting; the storage root is shared by every client.
#[derive(Debug)]
pub struct Client {
    addr: SocketAddr,
    connected_at: Instant,
    batches: usize,
    files_stored: usize,
}

impl Client {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            addr,
            connected_at: Instant::now(),
            batches: 0,
            files_stored: 0,
        }
    }

    /// Records one finished upload batch and how many files it stored.
    pub fn record_batch(&mut self, files_stored: usize) {
        self.batches += 1;
        self.files_stored += files_stored;
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn batches(&self) -> usize {
        self.batches
    }

    pub fn files_stored(&self) -> usize {
        self.files_stored
    }

    pub fn connected_secs(&self) -> u64 {
        self.connected_at.elapsed().as_secs()
    }
}
