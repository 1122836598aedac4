//! Outbound integrations: HTTP transport and the remote clients built on it.

pub mod http;
pub mod introspection;
pub mod team_directory;

pub use http::{HttpResponse, HttpTransport, TransportError};
pub use introspection::HttpIdentityResolver;
pub use team_directory::HttpTeamDirectory;
