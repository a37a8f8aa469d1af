pub mod event;
pub mod level;
pub mod motion;
pub mod pack;
pub mod play;
pub mod reveal;
pub mod session;
pub mod timer;
