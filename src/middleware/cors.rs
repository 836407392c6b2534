//! Cross-origin policy
//!
//! Every origin, method, and header is allowed, with credentials. Browsers
//! reject a literal `*` alongside credentials, so each one is mirrored back
//! from the request instead.

use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
