pub mod check;
pub mod evidence;
pub mod registry;
