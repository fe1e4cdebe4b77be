pub mod scaffold;
pub mod split;
