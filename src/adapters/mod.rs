//! Inference provider interfaces.
//!
//! Providers wrap external probabilistic services behind a single
//! prompt-in/text-out trait. The engine treats a missing or failing
//! provider as "no evidence from this source", never as an error.

pub mod azure;

use anyhow::Result;
use async_trait::async_trait;

pub use azure::AzureOpenAiProvider;

/// Trait for external inference providers
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Human-readable provider name
    fn name(&self) -> &str;

    /// Run one prompt and return the raw model text
    async fn infer(&self, prompt: &str) -> Result<String>;
}

/// Build a provider from the environment, if one is configured.
///
/// Returns `None` when no provider env is present; callers then run
/// pattern-extraction only.
pub fn provider_from_env() -> Option<Box<dyn InferenceProvider>> {
    AzureOpenAiProvider::from_env().map(|p| Box::new(p) as Box<dyn InferenceProvider>)
}
