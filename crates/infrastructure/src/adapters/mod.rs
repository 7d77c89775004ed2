//! Port adapters for the network and the device push service.

mod reqwest_transport;
mod static_push;

pub use reqwest_transport::ReqwestTransport;
pub use static_push::StaticPushPlatform;
