// src/models/mod.rs

pub mod exam;
pub mod question;
pub mod source_document;
pub mod weak_topic;
