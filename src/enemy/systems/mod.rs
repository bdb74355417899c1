pub mod attack;
pub mod behavior;
pub mod perception;
