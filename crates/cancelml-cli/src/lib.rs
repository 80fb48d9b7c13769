//! Library surface of the CLI crate: the prediction service, exposed so
//! handler tests can build the router in-process.
pub mod server;
