//! Docker-style image name normalization.
//!
//! Turns short names like `alpine` into fully qualified references like
//! `docker.io/library/alpine:latest`, the form `dist fetch` expects.

/// Default registry when none is specified.
const DEFAULT_REGISTRY: &str = "docker.io";

/// Namespace of official images on the default registry.
const DEFAULT_NAMESPACE: &str = "library";

/// Default tag when none is specified.
const DEFAULT_TAG: &str = "latest";

/// Normalize a Docker-style repository name into a fully qualified reference.
///
/// - `alpine` → `docker.io/library/alpine:latest`
/// - `myuser/app` → `docker.io/myuser/app:latest`
/// - `ghcr.io/org/app:v1` → unchanged
///
/// Any `:` in the name counts as a tag, so `localhost:5000/org/app` is
/// left without `:latest`.
pub fn normalize(reference: &str) -> String {
    let mut image = match reference.splitn(3, '/').count() {
        1 => format!("{}/{}/{}", DEFAULT_REGISTRY, DEFAULT_NAMESPACE, reference),
        2 => format!("{}/{}", DEFAULT_REGISTRY, reference),
        _ => reference.to_string(),
    };

    if !image.contains(':') {
        image.push(':');
        image.push_str(DEFAULT_TAG);
    }

    image
}
