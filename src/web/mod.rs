//! Front-end pages
//!
//! Pages are stored with shortcode markup such as `[tickefic_user_dashboard]`.
//! Rendering expands the shortcodes and injects the `SupportDashboard`
//! object the dashboard script reads its nonce and API base from.

use crate::core::Page;
use crate::error::Result;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tera::{Context, Tera};

pub const DASHBOARD_SHORTCODE: &str = "tickefic_user_dashboard";
pub const DASHBOARD_ROOT: &str = r#"<div id="user-dashboard-root"></div>"#;

const PAGE_TEMPLATE: &str = "page.html";

static SHORTCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([a-z][a-z0-9_-]*)\s*/?\]").expect("valid regex"));

/// The single configuration object handed to the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub nonce: String,
    pub api_url: String,
}

type ShortcodeHandler = fn() -> String;

/// Registered shortcodes
#[derive(Debug, Clone)]
pub struct Shortcodes {
    handlers: BTreeMap<String, ShortcodeHandler>,
}

impl Default for Shortcodes {
    fn default() -> Self {
        let mut shortcodes = Self {
            handlers: BTreeMap::new(),
        };
        shortcodes.register(DASHBOARD_SHORTCODE, render_user_dashboard);
        shortcodes
    }
}

impl Shortcodes {
    pub fn register(&mut self, tag: &str, handler: ShortcodeHandler) {
        self.handlers.insert(tag.to_string(), handler);
    }

    #[must_use]
    pub fn is_registered(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// Replace registered shortcodes in `content`; unknown ones are left as written
    #[must_use]
    pub fn expand(&self, content: &str) -> String {
        SHORTCODE
            .replace_all(content, |caps: &Captures<'_>| {
                self.handlers
                    .get(&caps[1])
                    .map_or_else(|| caps[0].to_string(), |handler| handler())
            })
            .into_owned()
    }
}

/// Mount point of the dashboard application
#[must_use]
pub fn render_user_dashboard() -> String {
    DASHBOARD_ROOT.to_string()
}

/// Renders stored pages to HTML documents
#[derive(Debug)]
pub struct PageRenderer {
    tera: Tera,
    shortcodes: Shortcodes,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(PAGE_TEMPLATE, include_str!("page.html.tera"))?;
        Ok(Self {
            tera,
            shortcodes: Shortcodes::default(),
        })
    }

    #[must_use]
    pub const fn shortcodes(&self) -> &Shortcodes {
        &self.shortcodes
    }

    pub fn render(&self, page: &Page, dashboard: &DashboardConfig) -> Result<String> {
        // Keep "</script>" in a value from closing the inline script
        let dashboard_json = serde_json::to_string(dashboard)?.replace("</", "<\\/");
        let mut context = Context::new();
        context.insert("title", &page.title);
        context.insert("slug", &page.slug);
        context.insert("body", &self.shortcodes.expand(&page.content));
        context.insert("dashboard_json", &dashboard_json);
        Ok(self.tera.render(PAGE_TEMPLATE, &context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::PageId;

    fn dashboard_page() -> Page {
        Page {
            id: PageId(1),
            title: "User Dashboard".to_string(),
            slug: "user-dashboard".to_string(),
            content: "[tickefic_user_dashboard]".to_string(),
        }
    }

    #[test]
    fn test_shortcode_expands_to_mount_point() {
        let shortcodes = Shortcodes::default();
        assert_eq!(shortcodes.expand("[tickefic_user_dashboard]"), DASHBOARD_ROOT);
        assert_eq!(
            shortcodes.expand("<p>Hi</p>[tickefic_user_dashboard /][gallery]"),
            format!("<p>Hi</p>{DASHBOARD_ROOT}[gallery]")
        );
    }

    #[test]
    fn test_render_injects_config() {
        let renderer = PageRenderer::new().unwrap();
        let html = renderer
            .render(
                &dashboard_page(),
                &DashboardConfig {
                    nonce: "abc123".to_string(),
                    api_url: "/wp-json/".to_string(),
                },
            )
            .unwrap();
        assert!(html.contains(DASHBOARD_ROOT));
        assert!(html.contains(r#"window.SupportDashboard = {"nonce":"abc123","api_url":"/wp-json/"};"#));
        assert!(html.contains("<title>User Dashboard</title>"));
    }

    #[test]
    fn test_config_cannot_close_script() {
        let renderer = PageRenderer::new().unwrap();
        let html = renderer
            .render(
                &dashboard_page(),
                &DashboardConfig {
                    nonce: "</script><b>".to_string(),
                    api_url: "/wp-json/".to_string(),
                },
            )
            .unwrap();
        assert!(!html.contains("</script><b>"));
    }
}
