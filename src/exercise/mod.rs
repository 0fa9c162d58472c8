pub mod input;
pub mod navigation;
pub mod scoring;
pub mod style;
pub mod test;
pub mod word;
