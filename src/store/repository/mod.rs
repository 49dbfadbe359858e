//! Repository modules for local store tables

pub mod drafts;
pub mod storage;
