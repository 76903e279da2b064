pub mod client;
pub mod request;

pub use client::{Credential, GithubClient};
pub use request::{ApiRequest, Permission};
