use async_trait::async_trait;
use hotswap_types::RemotePackage;

/// Asks the user whether to install an offered update.
///
/// For a mandatory package the answer is informational; the sync proceeds
/// either way.
#[async_trait]
pub trait UpdatePrompt: Send + Sync {
    async fn confirm(&self, package: &RemotePackage) -> bool;
}
