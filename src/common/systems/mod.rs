pub mod interp;
pub mod movement;
pub mod targeting;
