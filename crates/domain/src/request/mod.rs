//! Request-side types: verbs, bodies, query strings and descriptors.

mod body;
mod descriptor;
mod method;
mod prepared;
mod query;

pub use body::{MultipartField, RequestBody};
pub use descriptor::RequestDescriptor;
pub use method::HttpMethod;
pub use prepared::PreparedRequest;
pub use query::QueryParams;
