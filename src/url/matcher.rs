/// Checks if a hostname belongs to a crawl root domain
///
/// A candidate matches when it is the root itself or any subdomain of it:
/// `example.com` covers `example.com`, `blog.example.com` and
/// `api.v2.example.com`, but not `notexample.com` or `example.com.org`.
///
/// Both arguments are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use category_crawler::url::matches_domain;
///
/// assert!(matches_domain("example.com", "example.com"));
/// assert!(matches_domain("example.com", "blog.example.com"));
/// assert!(!matches_domain("example.com", "notexample.com"));
/// ```
pub fn matches_domain(root: &str, candidate: &str) -> bool {
    if root.is_empty() || candidate.is_empty() {
        return false;
    }

    candidate == root
        || candidate
            .strip_suffix(root)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
