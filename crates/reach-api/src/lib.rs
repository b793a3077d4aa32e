pub mod auth;
pub mod contracts;
pub mod conversations;
pub mod earnings;
pub mod error;
pub mod goals;
pub mod influencers;
pub mod jobs;
pub mod media;
pub mod middleware;
pub mod proposals;
pub mod routes;

mod convert;
