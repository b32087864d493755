// Threadwatch: forum group watcher with style-conditioned reply drafting
//
// This is the library root. Each module corresponds to a stage of the
// crawl-match-draft pipeline.

pub mod config;
pub mod db;
pub mod extract;
pub mod fetch;
pub mod llm;
pub mod matching;
pub mod output;
pub mod pipeline;
pub mod reply;
pub mod status;
pub mod style;
