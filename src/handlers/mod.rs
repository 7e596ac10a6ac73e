// handlers/mod.rs - HTTP handlers
//
// Every handler runs behind the access gate. Public handlers ignore the
// request context; API handlers take `RequestContext` as an extractor, which
// answers 401 JSON when the gate saw no signed-in principal. Data handlers
// scope every query to the context's effective organization and never
// re-derive it from the database.

pub mod admin;
pub mod auth;
pub mod organization;
pub mod pages;
pub mod public;
pub mod reports;
pub mod workouts;
