/*
* Embedding and vector store endpoints.
*/

pub mod handler;
pub mod routes;

pub use routes::vector_routes;
