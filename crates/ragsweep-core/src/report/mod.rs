pub mod jsonl;
pub mod progress;

pub use jsonl::{read_jsonl, write_jsonl};
