pub mod ai;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod cv;
pub mod error;
pub mod particles;
pub mod persona;
pub mod provider;

// Re-export main types for convenience
pub use ai::{CompletionClient, GeminiClient, OllamaClient};
pub use config::Config;
pub use controller::ChatController;
pub use conversation::{ChatEntry, Conversation, InputBuffer, Outcome, Phase, PendingRequest, RequestId};
pub use error::{CompletionError, FailureKind};
pub use particles::{Particle, ParticleEngine, Surface, Viewport};
pub use persona::QuickAsk;
pub use provider::Provider;
