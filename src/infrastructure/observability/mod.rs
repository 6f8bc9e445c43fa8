mod logging;
mod request_id;

pub use logging::{TracingConfig, init_tracing};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
