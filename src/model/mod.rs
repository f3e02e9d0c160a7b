pub mod auto_tune;
pub mod constants;
pub mod context;
pub mod db_structs;
pub mod handicap;
pub mod par_curve;
pub mod promotion;
pub mod ranking;
pub mod rating;
pub mod rating_tracker;
pub mod statistics;
pub mod structures;
pub mod wrs_model;
