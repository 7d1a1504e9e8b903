//! Human readable status page.

use std::fmt::Write;
use std::sync::Arc;

use axum::{extract::State, response::Html};

use altproxy_core::PublishedCatalog;

use crate::state::AppState;

/// GET /
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    let current = state.catalog().current().await;
    Html(render(&state, current.as_deref()))
}

fn render(state: &AppState, current: Option<&PublishedCatalog>) -> String {
    let title = escape(&state.config().catalog.name);
    let feed = format!("{}/apps.json", state.base_url());
    let add_source = format!("altstore://source?url={}", feed);

    let mut page = String::new();
    let _ = write!(
        page,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n<h1>{title}</h1>\n<p>{subtitle}</p>\n<p><a href=\"/apps.json\">{feed}</a></p>\n<p><a href=\"{add_source}\">Add source to AltStore</a></p>\n",
        title = title,
        subtitle = escape(&state.config().catalog.subtitle),
        feed = escape(&feed),
        add_source = escape(&add_source),
    );

    page.push_str("<h2>Sources</h2>\n<ul>\n");
    for source in &state.config().refresh.sources {
        let _ = writeln!(page, "<li>{}</li>", escape(source));
    }
    page.push_str("</ul>\n");

    match current {
        Some(published) => {
            let _ = writeln!(
                page,
                "<h2>Apps</h2>\n<p>{} apps from {} sources, updated {}</p>\n<ul>",
                published.catalog.apps.len(),
                published.sources,
                published.published_at.format("%Y-%m-%d %H:%M:%S UTC"),
            );
            for app in &published.catalog.apps {
                let _ = writeln!(
                    page,
                    "<li><a href=\"{}\">{}</a> v.{}</li>",
                    escape(&app.download_url),
                    escape(&app.name),
                    escape(&app.version),
                );
            }
            page.push_str("</ul>\n");
        }
        None => page.push_str("<p>The cache is being built, check back in a few minutes.</p>\n"),
    }

    page.push_str("</body>\n</html>\n");
    page
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use altproxy_core::testing::fixtures;
    use altproxy_core::{CatalogMerger, CatalogState, Config};
    use chrono::Utc;

    fn state() -> AppState {
        let mut config = Config::default();
        config.refresh.sources = vec!["https://a.example/apps.json?x=1&y=2".to_string()];
        AppState::new(
            config,
            "http://host:8080".to_string(),
            Arc::new(CatalogState::new()),
        )
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<b>\"Tom & Jerry\"</b>"), "&lt;b&gt;&quot;Tom &amp; Jerry&quot;&lt;/b&gt;");
    }

    #[test]
    fn test_render_not_ready() {
        let page = render(&state(), None);
        assert!(page.contains("<title>AltStore-Proxy</title>"));
        assert!(page.contains("altstore://source?url=http://host:8080/apps.json"));
        assert!(page.contains("https://a.example/apps.json?x=1&amp;y=2"));
        assert!(page.contains("being built"));
    }

    #[test]
    fn test_render_lists_apps() {
        let state = state();
        let merger = CatalogMerger::new(state.config().catalog.clone(), state.base_url());
        let published = PublishedCatalog {
            catalog: merger.merge(vec![fixtures::manifest(
                "https://a.example/apps.json",
                vec![fixtures::entry("<Foo>", "1.0", "http://host:8080/cache/Foo.ipa")],
            )]),
            cycle: 1,
            sources: 1,
            published_at: Utc::now(),
        };

        let page = render(&state, Some(&published));
        assert!(page.contains("1 apps from 1 sources"));
        assert!(page.contains("<a href=\"http://host:8080/cache/Foo.ipa\">&lt;Foo&gt;</a> v.1.0"));
        assert!(!page.contains("being built"));
    }
}
