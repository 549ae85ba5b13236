//! Robots.txt rule group
//!
//! This module wraps the robotstxt crate's matcher behind a rule group bound
//! to one crawler identity.

use robotstxt::DefaultMatcher;

/// Allow/deny rules of one domain's robots.txt, resolved for one agent
///
/// Immutable once built. Path checks consult only the groups that apply to
/// the crawler's product token (or the `*` group when no specific group
/// exists); a path with no matching rule is allowed.
#[derive(Debug, Clone)]
pub struct RobotsGroup {
    /// Raw robots.txt content
    content: String,
    /// Product token the rules are resolved for
    agent: String,
}

impl RobotsGroup {
    /// Creates a rule group from raw robots.txt content
    ///
    /// # Arguments
    ///
    /// * `content` - The raw robots.txt file content
    /// * `agent` - The crawler's product token (e.g. "CategorySearchBot")
    pub fn from_content(content: &str, agent: &str) -> Self {
        Self {
            content: content.to_string(),
            agent: agent.to_string(),
        }
    }

    /// The product token this group was resolved for
    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Checks if a URL (or a bare path such as "/page.html") may be fetched
    ///
    /// # Returns
    ///
    /// * `true` - If the URL is allowed
    /// * `false` - If the URL is disallowed
    pub fn is_allowed(&self, url: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, &self.agent, url)
    }
}
