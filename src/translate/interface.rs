use async_trait::async_trait;

/// Language detection and machine translation
#[async_trait]
pub trait Translator: Send + Sync {
    /// Most likely language code of `text`
    async fn detect_language(&self, text: &str) -> Result<String, anyhow::Error>;

    /// Translate `text` into `to`; the service detects the source when `from` is absent
    async fn translate(
        &self,
        text: &str,
        from: Option<&str>,
        to: &str,
    ) -> Result<String, anyhow::Error>;
}
