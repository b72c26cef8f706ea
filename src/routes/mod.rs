//! Router modules, one per audience.

/// Catalog, article and static pages plus the login entry points.
pub mod public;

/// Enrollment form, success page and logout. Handlers read the optional `Session`
/// themselves, so anonymous visitors get a login prompt instead of a 401.
pub mod enrollment;

/// JSON endpoints under `/api`, documented in the OpenAPI document.
pub mod api;
