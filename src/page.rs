use async_trait::async_trait;

/// Opaque reference to one interactive element on the current page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ControlHandle(pub String);

/// The remote form as seen by the driver: navigate, locate, click, type.
///
/// `find_controls` must return matches in document order, and the order must
/// be stable for an unchanged page. The driver relies on that and on exact
/// match counts when resolving the selector table.
#[async_trait]
pub trait Page: Send {
    async fn navigate(&mut self, url: &str) -> anyhow::Result<()>;

    async fn find_controls(&mut self, selector: &str) -> anyhow::Result<Vec<ControlHandle>>;

    /// First match, if any.
    async fn find_control(&mut self, selector: &str) -> anyhow::Result<Option<ControlHandle>> {
        Ok(self.find_controls(selector).await?.into_iter().next())
    }

    async fn click(&mut self, control: &ControlHandle) -> anyhow::Result<()>;

    async fn type_text(&mut self, control: &ControlHandle, text: &str) -> anyhow::Result<()>;

    /// Resolves once the current document has finished loading.
    async fn wait_until_ready(&mut self) -> anyhow::Result<()>;
}
