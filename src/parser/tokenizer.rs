// file: src/parser/tokenizer.rs
// description: text preprocessing for the category and embedding models

/// Splits text into lowercase word tokens and single punctuation tokens.
#[derive(Debug, Clone, Default)]
pub struct Tokenizer;

impl Tokenizer {
    pub fn new() -> Self {
        Self
    }

    pub fn tokens(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut word = String::new();

        for ch in text.chars() {
            if ch.is_alphanumeric() {
                word.extend(ch.to_lowercase());
                continue;
            }

            if !word.is_empty() {
                tokens.push(std::mem::take(&mut word));
            }

            if !ch.is_whitespace() {
                tokens.push(ch.to_string());
            }
        }

        if !word.is_empty() {
            tokens.push(word);
        }

        tokens
    }

    /// Tokens rejoined with single spaces.
    pub fn preprocess(&self, text: &str) -> String {
        self.tokens(text).join(" ")
    }
}
