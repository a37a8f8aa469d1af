pub mod cell;
pub mod grid;
pub mod history;
pub mod moves;
pub mod rules;
