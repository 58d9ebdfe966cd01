pub mod client;
pub mod interface;

pub use client::TranslateClient;
pub use interface::Translator;
