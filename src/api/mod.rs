pub mod body;

pub use body::{parse_body, parse_query, Payload};
