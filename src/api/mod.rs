pub mod fault;
pub mod middleware;
pub mod pagination;
pub mod response;
pub mod services;
pub mod types;
pub mod validation;
