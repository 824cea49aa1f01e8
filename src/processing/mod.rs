//! Resume and job-description scoring engine

pub mod analyzer;
pub mod ats_matcher;
pub mod cache;
pub mod dictionary;
pub mod document;
pub mod embeddings;
pub mod scoring;
pub mod text_processor;
