//! Redirect target and service URL construction.

use tracing::debug;

use crate::config::CasConfig;
use crate::request::CasRequest;

/// Where to send the user after login.
///
/// An explicit redirect-field query parameter wins. Otherwise the Referer
/// (unless `ignore_referer` is set) or the configured `redirect_url` is used,
/// with the request origin stripped so the result is origin-relative. Without
/// a request the configured default is returned as-is.
pub fn redirect_target(config: &CasConfig, request: Option<&CasRequest>) -> String {
    if let Some(next) = request
        .and_then(|r| r.query_param(&config.redirect_field_name))
        .filter(|next| !next.is_empty())
    {
        return next.to_string();
    }

    let default = config.redirect_url.clone();

    let request = match request {
        Some(request) => request,
        None => return default,
    };

    let next = if config.ignore_referer {
        default
    } else {
        request.referer().map(str::to_string).unwrap_or(default)
    };

    // Only strip a whole origin, not a longer host sharing its prefix
    let prefix = request.origin();
    match next.strip_prefix(prefix.as_str()) {
        Some(relative)
            if relative.is_empty() || relative.starts_with(['/', '?', '#']) =>
        {
            relative.to_string()
        }
        _ => next,
    }
}

/// Absolute callback URL the CAS server redirects back to.
///
/// Unless `store_next` is set, the post-login target travels along as an
/// encoded redirect-field parameter.
pub fn service_url(config: &CasConfig, request: &CasRequest, redirect_to: Option<&str>) -> String {
    let mut service = format!("{}{}", request.origin(), request.path());

    if !config.store_next {
        service.push(if service.contains('?') { '&' } else { '?' });

        let target = match redirect_to.filter(|t| !t.is_empty()) {
            Some(target) => target.to_string(),
            None => redirect_target(config, Some(request)),
        };

        service.push_str(&format!(
            "{}={}",
            urlencoding::encode(&config.redirect_field_name),
            urlencoding::encode(&target)
        ));
    }

    debug!(service = %service, "Built CAS service URL");
    service
}
