/*
* Notification sending and history.
*/

pub mod handler;
pub mod routes;

pub use routes::notification_routes;
