pub mod catalog;
pub mod passage;
pub mod tokenizer;
