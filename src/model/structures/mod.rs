pub mod curve_shape;
pub mod disqualification;
pub mod event_status;
pub mod history_ring;
pub mod race_result;
pub mod subdivision;
pub mod time_value;
