use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use crate::{locale::Locale, models::Article, views::escape};

pub const SITE_NAME: &str = "Tip-Top Education";
pub const DEFAULT_OG_IMAGE_PATH: &str = "/og-default.png";
const DEFAULT_DESCRIPTION_SUFFIX: &str = "Computer Training School";
const OG_IMAGE_WIDTH: u32 = 1200;
const OG_IMAGE_HEIGHT: u32 = 630;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// ArticleMetadata
///
/// Article-specific Open Graph fields (`og:type = article`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleMetadata {
    /// RFC 3339 timestamp.
    pub published_time: Option<String>,
    pub modified_time: Option<String>,
    pub section: Option<String>,
    pub authors: Vec<String>,
    pub tags: Vec<String>,
}

/// PageOptions
///
/// Per-page overrides for `build_page_metadata`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageOptions {
    /// Absolute URL or site path of the preview image. Defaults to `/og-default.png`.
    pub image: Option<String>,
    pub image_alt: Option<String>,
    /// Keeps the page out of search indexes (login, enrollment).
    pub no_index: bool,
    pub article: Option<ArticleMetadata>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OgImage {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenGraph {
    pub title: String,
    pub description: String,
    /// `website` or `article`.
    pub og_type: &'static str,
    pub url: String,
    pub locale: &'static str,
    pub site_name: &'static str,
    pub images: Vec<OgImage>,
    pub article: Option<ArticleMetadata>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TwitterCard {
    pub card: &'static str,
    pub title: String,
    pub description: String,
    pub images: Vec<String>,
}

/// PageMetadata
///
/// Everything that goes into a page's `<head>`: title, description, canonical and
/// alternate-language links, robots directive, Open Graph and Twitter Card.
#[derive(Debug, Clone, PartialEq)]
pub struct PageMetadata {
    pub title: String,
    pub description: String,
    pub canonical: String,
    pub alternates: Vec<(Locale, String)>,
    pub index: bool,
    pub open_graph: OpenGraph,
    pub twitter: TwitterCard,
}

fn page_url(base_url: &str, locale: Locale, path: &str) -> String {
    format!("{}{}", base_url, locale.href(path))
}

/// to_absolute_url
///
/// Crawlers (Facebook, Telegram, Viber) ignore relative image URLs, so site paths are
/// prefixed with the public origin. Absolute `http(s)` URLs pass through.
pub fn to_absolute_url(url: &str, base_url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    if url.starts_with('/') {
        format!("{base_url}{url}")
    } else {
        format!("{base_url}/{url}")
    }
}

/// build_page_metadata
///
/// Builds consistent SEO metadata for a page.
///
/// * `path` is the path after the locale, without a leading slash (`""`, `"courses"`,
///   `"articles/some-slug"`).
/// * An empty description falls back to `"Tip-Top Education - Computer Training School"`.
pub fn build_page_metadata(
    title: &str,
    description: Option<&str>,
    locale: Locale,
    path: &str,
    options: PageOptions,
    base_url: &str,
) -> PageMetadata {
    let url = page_url(base_url, locale, path);
    let image_url = to_absolute_url(
        options.image.as_deref().unwrap_or(DEFAULT_OG_IMAGE_PATH),
        base_url,
    );
    let image_alt = options
        .image_alt
        .clone()
        .unwrap_or_else(|| SITE_NAME.to_string());
    let description = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{SITE_NAME} - {DEFAULT_DESCRIPTION_SUFFIX}"));

    let alternates = Locale::ALL
        .iter()
        .map(|&alt| (alt, page_url(base_url, alt, path)))
        .collect();

    let article = options.article.map(|mut article| {
        article.authors.retain(|a| !a.is_empty());
        article.tags.retain(|t| !t.is_empty());
        article
    });

    PageMetadata {
        title: title.to_string(),
        description: description.clone(),
        canonical: url.clone(),
        alternates,
        index: !options.no_index,
        open_graph: OpenGraph {
            title: title.to_string(),
            description: description.clone(),
            og_type: if article.is_some() { "article" } else { "website" },
            url,
            locale: locale.og_locale(),
            site_name: SITE_NAME,
            images: vec![OgImage {
                url: image_url.clone(),
                width: OG_IMAGE_WIDTH,
                height: OG_IMAGE_HEIGHT,
                alt: image_alt,
            }],
            article,
        },
        twitter: TwitterCard {
            card: "summary_large_image",
            title: title.to_string(),
            description,
            images: vec![image_url],
        },
    }
}

/// Title with the site name appended: `"Courses | Tip-Top Education"`.
pub fn site_title(page: &str) -> String {
    format!("{page} | {SITE_NAME}")
}

fn meta_property(head: &mut String, property: &str, content: &str) {
    let _ = writeln!(
        head,
        r#"<meta property="{}" content="{}">"#,
        escape(property),
        escape(content)
    );
}

fn meta_name(head: &mut String, name: &str, content: &str) {
    let _ = writeln!(
        head,
        r#"<meta name="{}" content="{}">"#,
        escape(name),
        escape(content)
    );
}

impl PageMetadata {
    /// Renders the metadata as `<head>` markup. Every value is HTML-escaped.
    pub fn to_head_html(&self) -> String {
        let mut head = String::new();
        let _ = writeln!(head, "<title>{}</title>", escape(&self.title));
        meta_name(&mut head, "description", &self.description);
        meta_name(
            &mut head,
            "robots",
            if self.index { "index,follow" } else { "noindex,nofollow" },
        );
        let _ = writeln!(head, r#"<link rel="canonical" href="{}">"#, escape(&self.canonical));
        for (locale, href) in &self.alternates {
            let _ = writeln!(
                head,
                r#"<link rel="alternate" hreflang="{}" href="{}">"#,
                locale.code(),
                escape(href)
            );
        }

        let og = &self.open_graph;
        meta_property(&mut head, "og:title", &og.title);
        meta_property(&mut head, "og:description", &og.description);
        meta_property(&mut head, "og:type", og.og_type);
        meta_property(&mut head, "og:url", &og.url);
        meta_property(&mut head, "og:locale", og.locale);
        meta_property(&mut head, "og:site_name", og.site_name);
        for image in &og.images {
            meta_property(&mut head, "og:image", &image.url);
            meta_property(&mut head, "og:image:width", &image.width.to_string());
            meta_property(&mut head, "og:image:height", &image.height.to_string());
            meta_property(&mut head, "og:image:alt", &image.alt);
        }
        if let Some(article) = &og.article {
            if let Some(published) = &article.published_time {
                meta_property(&mut head, "article:published_time", published);
            }
            if let Some(modified) = &article.modified_time {
                meta_property(&mut head, "article:modified_time", modified);
            }
            if let Some(section) = &article.section {
                meta_property(&mut head, "article:section", section);
            }
            for author in &article.authors {
                meta_property(&mut head, "article:author", author);
            }
            for tag in &article.tags {
                meta_property(&mut head, "article:tag", tag);
            }
        }

        meta_name(&mut head, "twitter:card", self.twitter.card);
        meta_name(&mut head, "twitter:title", &self.twitter.title);
        meta_name(&mut head, "twitter:description", &self.twitter.description);
        for image in &self.twitter.images {
            meta_name(&mut head, "twitter:image", image);
        }
        head
    }
}

/// strip_html
///
/// Removes tags and collapses whitespace, for meta descriptions built from article HTML.
/// With `max_len`, text longer than that many characters is cut and suffixed with `…`.
pub fn strip_html(html: &str, max_len: Option<usize>) -> String {
    let without_tags = TAG_RE.replace_all(html, " ");
    let text = SPACE_RE.replace_all(&without_tags, " ").trim().to_string();
    match max_len {
        Some(max) if text.chars().count() > max => {
            let cut: String = text.chars().take(max).collect();
            format!("{}…", cut.trim())
        }
        _ => text,
    }
}

/// article_description
///
/// Description for social sharing: the excerpt, else the full stripped body, else
/// `"{title} - Tip-Top Education"`.
pub fn article_description(article: &Article) -> String {
    if let Some(excerpt) = article.excerpt.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        return excerpt.to_string();
    }
    if let Some(body) = article.body.as_deref().filter(|b| !b.is_empty()) {
        return strip_html(body, None);
    }
    format!("{} - {SITE_NAME}", article.title)
}

/// article_metadata
///
/// Full SEO metadata for an article detail page.
pub fn article_metadata(article: &Article, locale: Locale, base_url: &str) -> PageMetadata {
    let description = article_description(article);
    let published_time = article
        .published_at
        .as_deref()
        .and_then(|p| chrono::DateTime::parse_from_rfc3339(p).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc).to_rfc3339());

    build_page_metadata(
        &site_title(&article.title),
        Some(&description),
        locale,
        &format!("articles/{}", article.slug),
        PageOptions {
            image: article.image_url.clone(),
            image_alt: Some(article.title.clone()),
            no_index: false,
            article: Some(ArticleMetadata {
                published_time,
                section: article.category.clone(),
                ..ArticleMetadata::default()
            }),
        },
        base_url,
    )
}
