pub mod theme;
pub mod settings;
pub mod config;
pub mod song;


pub use song::{SongTiming, SongTimingLoader};
pub use settings::{Settings};
pub use config::{AppConfig};
pub use theme::{Theme};
