use tracing::{info, warn};

use crate::browser::{Launcher, Session};
use crate::error::{Result, ScrapeError};
use crate::model::{HomePage, SubpageDossier};
use crate::normalize::CanonicalUrl;
use crate::parser;

/// Everything gathered while the browser is open.
pub struct Crawl {
    pub home: HomePage,
    pub home_html: String,
    pub subpages: SubpageBatch,
}

#[derive(Default)]
pub struct SubpageBatch {
    pub dossiers: Vec<SubpageDossier>,
    /// Visible text of every visited sub-page, each behind a header line.
    pub text: String,
    pub skipped: Vec<(String, ScrapeError)>,
}

/// Acquire a session, crawl, and release the session on every path.
pub async fn crawl_site(
    launcher: &dyn Launcher,
    target: &CanonicalUrl,
    max_subpages: usize,
) -> Result<Crawl> {
    let mut session = launcher.launch().await?;
    let crawled = crawl_with(session.as_mut(), target, max_subpages).await;
    session.release().await;
    crawled
}

/// Home page first (fatal on failure), then sub-pages (each skippable).
pub async fn crawl_with(
    session: &mut dyn Session,
    target: &CanonicalUrl,
    max_subpages: usize,
) -> Result<Crawl> {
    info!("Browser visiting home page: {}", target.canonical);
    session.navigate(&target.canonical).await?;
    let home_html = session.markup().await?;

    let scan = parser::process_home(&home_html, &target.canonical, &target.origin, max_subpages);
    info!("Content links selected for analysis: {:?}", scan.links);

    let subpages = visit_subpages(session, &scan.links).await;
    Ok(Crawl {
        home: scan.page,
        home_html,
        subpages,
    })
}

/// Visit links one at a time on the same session. A failed link is logged and skipped.
pub async fn visit_subpages(session: &mut dyn Session, links: &[String]) -> SubpageBatch {
    let mut batch = SubpageBatch::default();

    for link in links {
        match visit_one(session, link).await {
            Ok((dossier, text)) => {
                batch
                    .text
                    .push_str(&format!("\n\n--- PAGE CONTENT: {} ---\n{}", link, text));
                batch.dossiers.push(dossier);
            }
            Err(e) => {
                warn!("Skipping sub-page {}: {}", link, e);
                batch.skipped.push((link.clone(), e));
            }
        }
    }

    batch
}

async fn visit_one(session: &mut dyn Session, link: &str) -> Result<(SubpageDossier, String)> {
    info!("Visiting sub-page: {}", link);
    session.navigate(link).await?;
    let html = session.markup().await?;
    Ok(parser::process_subpage(&html, link))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::testing::{FakeLauncher, FakePage};

    fn home_with_links(n: usize) -> String {
        let links: String = (0..n)
            .map(|i| format!("<a href='/services/s{}'>Service {}</a>", i, i))
            .collect();
        format!("<html><head><title>Home</title></head><body>{}</body></html>", links)
    }

    fn sub(title: &str) -> FakePage {
        FakePage::Html(format!(
            "<html><head><title>{0}</title></head><body><h2>{0} heading</h2></body></html>",
            title
        ))
    }

    #[tokio::test]
    async fn bounded_to_first_five_in_order() {
        let launcher = FakeLauncher::new().page("https://acme.example", FakePage::Html(home_with_links(20)));
        for i in 0..20 {
            launcher.add(&format!("https://acme.example/services/s{}", i), sub(&format!("S{}", i)));
        }
        let target = normalize("https://acme.example/").unwrap();

        let crawl = crawl_site(&launcher, &target, 5).await.unwrap();
        let visited: Vec<&str> = crawl.subpages.dossiers.iter().map(|d| d.visited_url.as_str()).collect();
        assert_eq!(
            visited,
            vec![
                "https://acme.example/services/s0",
                "https://acme.example/services/s1",
                "https://acme.example/services/s2",
                "https://acme.example/services/s3",
                "https://acme.example/services/s4",
            ]
        );
        assert_eq!(crawl.subpages.dossiers[0].heading_map, vec!["H2: S0 heading"]);
        assert_eq!(launcher.navigations(), 6);
        assert_eq!(launcher.releases(), 1);
    }

    #[tokio::test]
    async fn one_timeout_skips_only_that_page() {
        let launcher = FakeLauncher::new()
            .page("https://acme.example", FakePage::Html(home_with_links(3)))
            .page("https://acme.example/services/s0", sub("S0"))
            .page("https://acme.example/services/s1", FakePage::NavigationTimeout)
            .page("https://acme.example/services/s2", sub("S2"));
        let target = normalize("https://acme.example").unwrap();

        let crawl = crawl_site(&launcher, &target, 5).await.unwrap();
        assert_eq!(crawl.subpages.dossiers.len(), 2);
        assert_eq!(crawl.subpages.skipped.len(), 1);
        assert_eq!(crawl.subpages.skipped[0].0, "https://acme.example/services/s1");
        assert!(crawl.subpages.text.contains("--- PAGE CONTENT: https://acme.example/services/s0 ---"));
        assert!(crawl.subpages.text.contains("S2 heading"));
        assert!(!crawl.subpages.text.contains("services/s1 ---"));
    }

    #[tokio::test]
    async fn home_timeout_is_fatal_and_still_releases() {
        let launcher = FakeLauncher::new().page("https://acme.example", FakePage::NavigationTimeout);
        let target = normalize("https://acme.example").unwrap();

        let err = crawl_site(&launcher, &target, 5).await.err().unwrap();
        assert!(matches!(err, ScrapeError::NavigationTimeout { .. }));
        assert_eq!(launcher.releases(), 1);
    }

    #[tokio::test]
    async fn home_dom_wait_timeout_is_fatal() {
        let launcher = FakeLauncher::new().page("https://acme.example", FakePage::WaitTimeout);
        let target = normalize("https://acme.example").unwrap();

        let err = crawl_site(&launcher, &target, 5).await.err().unwrap();
        assert!(matches!(err, ScrapeError::WaitTimeout { .. }));
        assert_eq!(launcher.releases(), 1);
    }

    #[tokio::test]
    async fn driver_unavailable_never_opens_a_session() {
        let launcher = FakeLauncher::unavailable();
        let target = normalize("https://acme.example").unwrap();

        let err = crawl_site(&launcher, &target, 5).await.err().unwrap();
        assert!(matches!(err, ScrapeError::DriverUnavailable(_)));
        assert_eq!(launcher.launches(), 0);
        assert_eq!(launcher.releases(), 0);
    }
}
