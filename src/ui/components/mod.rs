pub mod completion;
pub mod menu;
pub mod notice;
pub mod passage_view;
pub mod progress_bar;
pub mod style_examples;
pub mod test_picker;
