/*
* Metasearch endpoints: search, query analysis and trends.
*/

pub mod handler;
pub mod routes;

pub use routes::search_routes;
