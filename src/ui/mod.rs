pub mod canvas;
pub mod draw;
pub mod gamepad;
pub mod input;
pub mod locale;
pub mod renderer;
pub mod screen;
pub mod surface;
