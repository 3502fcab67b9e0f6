pub mod category;
pub mod clock;
pub mod date_extractor;
pub mod repository;
pub mod text_parser;
pub mod timestamp;
pub mod todo;
