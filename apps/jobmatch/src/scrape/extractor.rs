//! HTML → records for the careers site.
//!
//! Both entry points are pure and never fail: a missing element degrades the
//! field it feeds, not the page.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::models::job::{JobDetail, JobSummary, NOT_AVAILABLE, UNKNOWN_TITLE};

/// Relative listing links are resolved against this base.
const APPLICATIONS_BASE: &str = "https://www.google.com/about/careers/applications";

static BASE_URL: Lazy<Option<Url>> = Lazy::new(|| Url::parse(APPLICATIONS_BASE).ok());

static JOB_CARD: Lazy<Selector> = Lazy::new(|| selector("li.lLd3Je"));
static CARD_TITLE: Lazy<Selector> = Lazy::new(|| selector("h3.QJPWVe"));
static CARD_LOCATION: Lazy<Selector> = Lazy::new(|| selector("span.r0wTof"));
static CARD_LEVEL: Lazy<Selector> = Lazy::new(|| selector("span.wVSTAb"));
static CARD_LINK: Lazy<Selector> = Lazy::new(|| selector("a.WpHeLc"));
static NEXT_PAGE_LINK: Lazy<Selector> =
    Lazy::new(|| selector(r#"div.VfPpkd-Bz112c-LgbsSe[jsname="ViaHrd"] a.WpHeLc"#));
static PAGINATION_LABEL: Lazy<Selector> =
    Lazy::new(|| selector(r#"div.VfPpkd-wZVHld-gruSEe-j4LONd div[jsname="uEp2ad"]"#));
static SECTION_NODES: Lazy<Selector> = Lazy::new(|| selector("h3, ul"));
static LIST_ITEM: Lazy<Selector> = Lazy::new(|| selector("li"));

/// "1‒20 of 1,234": the count may carry thousands separators.
static TOTAL_COUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"of\s+(\d[\d,]*)").expect("total count regex"));

const MIN_QUALS_HEADING: &str = "Minimum qualifications:";
const PREF_QUALS_HEADING: &str = "Preferred qualifications:";
const ABOUT_HEADING: &str = "About the job";
const RESPONSIBILITIES_HEADING: &str = "Responsibilities";

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

/// Everything one listing page yields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    pub jobs: Vec<JobSummary>,
    pub next_page_url: Option<String>,
    pub total_job_count: u32,
}

pub fn extract_listing_page(html: &str, page: u32) -> ListingPage {
    if html.trim().is_empty() {
        return ListingPage::default();
    }

    let document = Html::parse_document(html);

    let jobs = document
        .select(&JOB_CARD)
        .map(|card| JobSummary {
            page,
            title: first_text(card, &CARD_TITLE).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            location: first_text(card, &CARD_LOCATION).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            experience_level: first_text(card, &CARD_LEVEL)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            url: card
                .select(&CARD_LINK)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(resolve_link)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        })
        .collect();

    let next_page_url = document
        .select(&NEXT_PAGE_LINK)
        .next()
        .and_then(|a| a.value().attr("href"))
        .and_then(resolve_link);

    let total_job_count = document
        .select(&PAGINATION_LABEL)
        .next()
        .map(element_text)
        .and_then(|label| {
            TOTAL_COUNT_RE
                .captures(&label)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().replace(',', "").parse::<u32>().ok())
        })
        .unwrap_or(0);

    ListingPage {
        jobs,
        next_page_url,
        total_job_count,
    }
}

pub fn extract_job_detail(html: &str) -> JobDetail {
    if html.trim().is_empty() {
        return JobDetail::default();
    }

    let document = Html::parse_document(html);
    // Headings and lists in document order; "the list after a heading" is the next `ul` here.
    let nodes: Vec<ElementRef<'_>> = document.select(&SECTION_NODES).collect();

    JobDetail {
        minimum_qualifications: list_after_heading(&nodes, MIN_QUALS_HEADING),
        preferred_qualifications: list_after_heading(&nodes, PREF_QUALS_HEADING),
        about_job: paragraphs_after_heading(&nodes, ABOUT_HEADING),
        responsibilities: list_after_heading(&nodes, RESPONSIBILITIES_HEADING),
    }
}

fn list_after_heading(nodes: &[ElementRef<'_>], heading: &str) -> Option<Vec<String>> {
    let pos = find_heading(nodes, heading)?;
    let items = nodes[pos + 1..]
        .iter()
        .find(|el| el.value().name() == "ul")
        .map(|ul| ul.select(&LIST_ITEM).map(element_text).collect())
        .unwrap_or_default();
    Some(items)
}

/// Sibling `<p>` elements following the heading, up to the next `<h3>`, joined by spaces.
fn paragraphs_after_heading(nodes: &[ElementRef<'_>], heading: &str) -> Option<String> {
    let pos = find_heading(nodes, heading)?;
    let paragraphs: Vec<String> = nodes[pos]
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .take_while(|el| el.value().name() != "h3")
        .filter(|el| el.value().name() == "p")
        .map(element_text)
        .collect();
    Some(paragraphs.join(" "))
}

fn find_heading(nodes: &[ElementRef<'_>], heading: &str) -> Option<usize> {
    nodes
        .iter()
        .position(|el| el.value().name() == "h3" && element_text(*el) == heading)
}

fn first_text(scope: ElementRef<'_>, sel: &Selector) -> Option<String> {
    scope.select(sel).next().map(element_text)
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn resolve_link(href: &str) -> Option<String> {
    BASE_URL.as_ref()?.join(href).ok().map(String::from)
}
