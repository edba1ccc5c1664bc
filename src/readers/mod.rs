pub mod replay;
pub mod source;
pub mod weather_underground;

pub use replay::ReplaySource;
pub use source::ReadingSource;
pub use weather_underground::{parse_current, WeatherUndergroundSource};
