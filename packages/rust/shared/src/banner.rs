//! License/attribution banner prepended to generated stylesheets and scripts.

use chrono::{Datelike, Utc};

use crate::config::SiteConfig;

/// Render the banner comment block for generated output.
///
/// ```text
/// /*!
///  * Landing Page v6.0.6 (https://example.com)
///  * Copyright 2013-2026 Example Author
///  * Licensed under MIT
///  */
/// ```
pub fn render(site: &SiteConfig) -> String {
    render_for_year(site, Utc::now().year())
}

/// Render with an explicit current year. Split out so the output is
/// deterministic under test.
pub fn render_for_year(site: &SiteConfig, current_year: i32) -> String {
    let title = if site.title.is_empty() {
        &site.name
    } else {
        &site.title
    };

    let years = match site.copyright_start_year {
        Some(start) if start < current_year => format!("{start}-{current_year}"),
        _ => current_year.to_string(),
    };

    let mut banner = String::from("/*!\n");

    if site.homepage.is_empty() {
        banner.push_str(&format!(" * {title} v{}\n", site.version));
    } else {
        banner.push_str(&format!(" * {title} v{} ({})\n", site.version, site.homepage));
    }

    if site.author.is_empty() {
        banner.push_str(&format!(" * Copyright {years}\n"));
    } else {
        banner.push_str(&format!(" * Copyright {years} {}\n", site.author));
    }

    banner.push_str(&format!(" * Licensed under {}\n", site.license));
    banner.push_str(" */\n\n");
    banner
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_site() -> SiteConfig {
        SiteConfig {
            name: "landing-page".into(),
            title: "Landing Page".into(),
            version: "6.0.6".into(),
            author: "Example Author".into(),
            license: "MIT".into(),
            homepage: "https://example.com".into(),
            copyright_start_year: Some(2013),
        }
    }

    #[test]
    fn banner_interpolates_metadata() {
        let banner = render_for_year(&sample_site(), 2026);
        assert!(banner.starts_with("/*!\n"));
        assert!(banner.contains("Landing Page v6.0.6 (https://example.com)"));
        assert!(banner.contains("Copyright 2013-2026 Example Author"));
        assert!(banner.contains("Licensed under MIT"));
        assert!(banner.ends_with("*/\n\n"));
    }

    #[test]
    fn banner_without_optional_fields() {
        let site = SiteConfig {
            name: "bare".into(),
            ..SiteConfig::default()
        };
        let banner = render_for_year(&site, 2026);
        assert!(banner.contains("bare v0.1.0\n"));
        assert!(banner.contains("Copyright 2026\n"));
        assert!(!banner.contains("()"));
    }

    #[test]
    fn start_year_equal_to_current_collapses() {
        let mut site = sample_site();
        site.copyright_start_year = Some(2026);
        let banner = render_for_year(&site, 2026);
        assert!(banner.contains("Copyright 2026 "));
        assert!(!banner.contains("2026-2026"));
    }
}
