//! REST clients for the storefront backend.

pub mod client;
pub mod http_client;
pub mod payments;
pub mod users;

pub use client::ApiClient;
pub use http_client::{HttpClient, HttpMethod, ReqwestHttpClient, SimpleHttpResponse};
pub use payments::{NewPayment, Payment, PaymentStatus, PaymentsApi, RefundRequest};
pub use users::{User, UserUpdate, UsersApi};
