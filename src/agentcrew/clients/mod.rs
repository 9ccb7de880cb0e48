//! Provider specific [`ClientWrapper`](crate::client_wrapper::ClientWrapper) implementations.
//!
//! [`openai::OpenAIClient`] speaks the OpenAI Chat Completions protocol, which most hosted and
//! self-hosted inference servers also accept. [`http_pool`] keeps one connection pool per base
//! URL for every client and capability that goes over HTTP.

pub mod http_pool;
pub mod openai;
