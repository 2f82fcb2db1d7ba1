// src/handlers/mod.rs

pub mod documents;
pub mod exams;
pub mod weak_topics;
