pub mod lock_on;
pub mod view_rig;
