pub mod config;
pub mod grammar;
pub mod http;
pub mod lang;
pub mod llm;
pub mod pipeline;
pub mod playback;
pub mod session;
pub mod settings;
pub mod shadowing;
pub mod speech;
pub mod translate;
