// src/collections/mod.rs

//! Local collection interfaces over remote list keys.

pub mod list;
pub mod queue;

pub use list::RemoteList;
pub use queue::RemoteQueue;
