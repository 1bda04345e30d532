//! LLM provider implementations

mod http_client;
mod openrouter;

pub use http_client::{HttpClient, HttpClientTrait, HttpResponse, TransportError};
pub use openrouter::OpenRouterClient;

#[cfg(test)]
pub use http_client::mock::{MockHttpClient, MockReply};
