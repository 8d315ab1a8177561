// file: src/parser/mod.rs
// description: html extraction and text preprocessing module exports
// reference: internal module structure

pub mod date;
pub mod html;
pub mod tokenizer;

pub use date::parse_timestamp;
pub use html::HtmlExtractor;
pub use tokenizer::Tokenizer;
