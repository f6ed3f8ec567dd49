//! Link discovery on the layout site

use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::errors::{ArchiveError, Result};
use crate::models::{DateKey, DetailFailurePolicy, PageIndex};
use crate::pacer::Pacer;
use crate::transport::Transport;

/// Crawls `{layout_base}{YYYYMM}/{DD}/node_NN.html` pages for PDF links
#[derive(Debug)]
pub struct IndexCrawl {
    layout_base: String,
    pdf_base: String,
    relative_prefix: String,
    policy: DetailFailurePolicy,
    pacer: Pacer,
}

impl IndexCrawl {
    pub fn new(
        layout_base: impl Into<String>,
        pdf_base: impl Into<String>,
        relative_prefix: impl Into<String>,
        policy: DetailFailurePolicy,
        pacer: Pacer,
    ) -> Self {
        IndexCrawl {
            layout_base: layout_base.into(),
            pdf_base: pdf_base.into(),
            relative_prefix: relative_prefix.into(),
            policy,
            pacer,
        }
    }

    pub fn node_url(&self, date: DateKey, page: PageIndex) -> Result<String> {
        let base = Url::parse(&self.layout_base).map_err(|e| ArchiveError::invalid_url(&self.layout_base, e))?;
        let relative = format!("{}/node_{}.html", date.layout_fragment(), page.padded());
        base.join(&relative)
            .map(String::from)
            .map_err(|e| ArchiveError::invalid_url(relative, e))
    }

    pub async fn crawl(&self, transport: &dyn Transport, date: DateKey) -> Result<Vec<String>> {
        let first = PageIndex::FIRST;
        let index_url = self.node_url(date, first)?;

        self.pacer.ready().await;
        let index_html = transport.get_text(&index_url).await;
        self.pacer.completed();
        let index_html = index_html?;

        let page_count = count_layout_pages(&index_html);
        info!("{} has {} layout pages", date, page_count);

        let mut urls = Vec::with_capacity(page_count as usize);
        for page in PageIndex::up_to(page_count) {
            let resolved = if page == first {
                self.pdf_url_from(&index_url, &index_html)
            } else {
                self.resolve_page(transport, date, page).await
            };

            match resolved {
                Ok(url) => {
                    debug!("{} page {}: {}", date, page, url);
                    urls.push(url);
                }
                Err(e) => match self.policy {
                    DetailFailurePolicy::AbortDate => return Err(e),
                    DetailFailurePolicy::SkipPage => {
                        warn!("Skipping {} page {}: {}", date, page, e);
                    }
                },
            }
        }

        Ok(urls)
    }

    async fn resolve_page(
        &self,
        transport: &dyn Transport,
        date: DateKey,
        page: PageIndex,
    ) -> Result<String> {
        let page_url = self.node_url(date, page)?;

        self.pacer.ready().await;
        let html = transport.get_text(&page_url).await;
        self.pacer.completed();

        self.pdf_url_from(&page_url, &html?)
    }

    fn pdf_url_from(&self, page_url: &str, html: &str) -> Result<String> {
        let link = extract_pdf_link(html).ok_or_else(|| ArchiveError::MissingLink(page_url.to_string()))?;
        normalize_pdf_link(&self.pdf_base, &self.relative_prefix, &link)
    }
}

/// Number of `.swiper-slide` entries, one per layout page
pub fn count_layout_pages(html: &str) -> u32 {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse(".swiper-slide") else {
        return 0;
    };
    document.select(&selector).count() as u32
}

/// `href` of the download anchor inside the `right btn` element
pub fn extract_pdf_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(".right.btn a").ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|anchor| anchor.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}

/// Strip the leading relative prefix and resolve against the PDF base
pub fn normalize_pdf_link(pdf_base: &str, relative_prefix: &str, link: &str) -> Result<String> {
    let base = Url::parse(pdf_base).map_err(|e| ArchiveError::invalid_url(pdf_base, e))?;
    let relative = link.strip_prefix(relative_prefix).unwrap_or(link);
    base.join(relative)
        .map(String::from)
        .map_err(|e| ArchiveError::invalid_url(link, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeTransport;
    use chrono::NaiveDate;

    const LAYOUT: &str = "http://paper.people.com.cn/rmrb/pc/layout/";
    const PDF_BASE: &str = "https://paper.people.com.cn/rmrb/pc/";

    fn date() -> DateKey {
        DateKey::new(NaiveDate::from_ymd_opt(2025, 7, 3).unwrap())
    }

    fn crawler(policy: DetailFailurePolicy) -> IndexCrawl {
        IndexCrawl::new(LAYOUT, PDF_BASE, "../../../", policy, Pacer::unpaced("detail"))
    }

    fn layout_page(slides: u32, page: u32) -> String {
        let mut html = String::from("<html><body><div class=\"swiper-wrapper\">");
        for i in 1..=slides {
            html.push_str(&format!(
                "<div class=\"swiper-slide\"><a href=\"node_{:02}.html\">{:02}</a></div>",
                i, i
            ));
        }
        html.push_str(&format!(
            "</div><p class=\"right btn\"><a href=\"../../../attachement/202507/03/page{:02}.pdf\">PDF</a></p></body></html>",
            page
        ));
        html
    }

    fn node(page: u32) -> String {
        format!("{}202507/03/node_{:02}.html", LAYOUT, page)
    }

    #[test]
    fn test_node_url() {
        let page = PageIndex::FIRST;
        assert_eq!(crawler(DetailFailurePolicy::AbortDate).node_url(date(), page).unwrap(), node(1));
    }

    #[test]
    fn test_count_layout_pages() {
        assert_eq!(count_layout_pages(&layout_page(8, 1)), 8);
        assert_eq!(count_layout_pages("<html><body></body></html>"), 0);
    }

    #[test]
    fn test_extract_and_normalize_link() {
        let link = extract_pdf_link(&layout_page(2, 5)).unwrap();
        assert_eq!(link, "../../../attachement/202507/03/page05.pdf");
        assert_eq!(
            normalize_pdf_link(PDF_BASE, "../../../", &link).unwrap(),
            "https://paper.people.com.cn/rmrb/pc/attachement/202507/03/page05.pdf"
        );
        assert!(extract_pdf_link("<p class=\"right btn\">no anchor</p>").is_none());
    }

    #[test]
    fn test_normalize_keeps_absolute_and_plain_links() {
        assert_eq!(
            normalize_pdf_link(PDF_BASE, "../../../", "https://cdn.example.com/x.pdf").unwrap(),
            "https://cdn.example.com/x.pdf"
        );
        assert_eq!(
            normalize_pdf_link(PDF_BASE, "../../../", "attachement/x.pdf").unwrap(),
            "https://paper.people.com.cn/rmrb/pc/attachement/x.pdf"
        );
    }

    #[tokio::test]
    async fn test_crawl_resolves_every_page() {
        let transport = FakeTransport::new()
            .text(&node(1), &layout_page(3, 1))
            .text(&node(2), &layout_page(3, 2))
            .text(&node(3), &layout_page(3, 3));

        let urls = crawler(DetailFailurePolicy::AbortDate)
            .crawl(&transport, date())
            .await
            .unwrap();

        assert_eq!(
            urls,
            vec![
                "https://paper.people.com.cn/rmrb/pc/attachement/202507/03/page01.pdf",
                "https://paper.people.com.cn/rmrb/pc/attachement/202507/03/page02.pdf",
                "https://paper.people.com.cn/rmrb/pc/attachement/202507/03/page03.pdf",
            ]
        );
        assert_eq!(transport.requests(), vec![node(1), node(2), node(3)]);
    }

    #[tokio::test]
    async fn test_index_failure_fails_date() {
        let transport = FakeTransport::new().status(&node(1), 404);
        let result = crawler(DetailFailurePolicy::SkipPage).crawl(&transport, date()).await;
        assert!(matches!(result, Err(ArchiveError::Status { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_bad_detail_page_aborts_date() {
        let transport = FakeTransport::new()
            .text(&node(1), &layout_page(3, 1))
            .text(&node(2), "<html><body>maintenance</body></html>")
            .text(&node(3), &layout_page(3, 3));

        let result = crawler(DetailFailurePolicy::AbortDate).crawl(&transport, date()).await;

        assert!(matches!(result, Err(ArchiveError::MissingLink(_))));
        assert_eq!(transport.requests(), vec![node(1), node(2)]);
    }

    #[tokio::test]
    async fn test_bad_detail_page_skipped_when_tolerant() {
        let transport = FakeTransport::new()
            .text(&node(1), &layout_page(3, 1))
            .status(&node(2), 502)
            .text(&node(3), &layout_page(3, 3));

        let urls = crawler(DetailFailurePolicy::SkipPage)
            .crawl(&transport, date())
            .await
            .unwrap();

        assert_eq!(urls.len(), 2);
        assert!(urls[1].ends_with("page03.pdf"));
    }
}
