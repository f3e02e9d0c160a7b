pub mod event_parser;
pub mod player_store;
pub mod tokens;
