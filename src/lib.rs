pub mod audio;
pub mod components;
pub mod debug;
pub mod file;
pub mod scenes;
pub mod states;
pub mod sync;
