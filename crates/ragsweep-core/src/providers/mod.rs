pub mod http;
pub mod llm;
pub mod network;
