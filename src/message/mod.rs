mod nom_parser;
pub mod tags;
mod types;

pub use self::nom_parser::ParsedMessage;
pub use self::tags::TagMap;
pub use self::types::Message;
