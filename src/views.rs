//! Server-rendered HTML pages.
//!
//! Markup is deliberately plain and semantic; all interpolated text goes through
//! [`escape`] except article bodies, which are trusted CMS HTML.

use std::fmt::Write as _;

use crate::{
    api::encode_component,
    enrollment::{CLASS_OPTIONS, CtaState, EnrollmentFormValues, SuccessStatus},
    format,
    locale::{Locale, switch_locale_href},
    models::{Article, Course, FieldErrors, SchoolType},
    seo::{PageMetadata, SITE_NAME},
};

/// Escapes text for HTML element content and double-quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// PageContext
///
/// Where the page is being rendered: its locale and the request path and query, needed by
/// the locale switcher.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub locale: Locale,
    pub path: String,
    pub query: Option<String>,
}

impl PageContext {
    pub fn new(locale: Locale, path: &str, query: Option<&str>) -> Self {
        Self {
            locale,
            path: path.to_string(),
            query: query.map(str::to_string),
        }
    }

    fn href(&self, path: &str) -> String {
        self.locale.href(path)
    }
}

fn locale_switcher(ctx: &PageContext) -> String {
    let links: Vec<String> = Locale::ALL
        .iter()
        .map(|&target| {
            let href = switch_locale_href(target, &ctx.path, ctx.query.as_deref());
            let current = if target == ctx.locale {
                r#" aria-current="true""#
            } else {
                ""
            };
            format!(
                r#"<a href="{}" hreflang="{}"{}>{}</a>"#,
                escape(&href),
                target.code(),
                current,
                target.label()
            )
        })
        .collect();
    format!(r#"<span class="locale-switcher">{}</span>"#, links.join(" | "))
}

/// Wraps page content in the shared document: head metadata, nav, footer.
pub fn layout(ctx: &PageContext, meta: &PageMetadata, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{head}</head>
<body>
<header>
<nav>
<a href="{home}" class="brand">{site}</a>
<a href="{courses}">Courses</a>
<a href="{articles}">Articles</a>
<a href="{contact}">Contact</a>
{switcher}
</nav>
</header>
<main>
{content}
</main>
<footer>
<p>&copy; {site}</p>
<a href="{privacy}">Privacy</a>
</footer>
</body>
</html>
"#,
        lang = ctx.locale.html_lang(),
        head = meta.to_head_html(),
        home = ctx.href(""),
        courses = ctx.href("courses"),
        articles = ctx.href("articles"),
        contact = ctx.href("contact"),
        privacy = ctx.href("privacy"),
        site = SITE_NAME,
        switcher = locale_switcher(ctx),
    )
}

// --- Catalog ---

fn course_card(ctx: &PageContext, course: &Course) -> String {
    let mut facts = String::new();
    if let Some(duration) = format::duration_label(course) {
        let _ = write!(facts, "<li>{}</li>", escape(&duration));
    }
    if let Some(fee) = course.monthly_fee {
        let _ = write!(facts, "<li>{}/month</li>", escape(&format::format_mmk(fee)));
    }
    format!(
        r#"<li class="course-card"><a href="{href}">
<span class="subject">{subject}</span>
<h3>{title}</h3>
<ul>{facts}</ul>
<span>View details</span>
</a></li>"#,
        href = escape(&ctx.href(&format!("courses/{}", course.slug))),
        subject = escape(course.subject.as_ref().map_or("Course", |s| s.name.as_str())),
        title = escape(&course.title),
    )
}

fn course_grid(ctx: &PageContext, courses: &[Course]) -> String {
    if courses.is_empty() {
        return r#"<p class="empty">No courses are open right now. Please check back soon.</p>"#
            .to_string();
    }
    let cards: String = courses.iter().map(|c| course_card(ctx, c)).collect();
    format!(r#"<ul class="course-grid">{cards}</ul>"#)
}

pub fn home_page(ctx: &PageContext, meta: &PageMetadata, courses: &[Course]) -> String {
    let content = format!(
        "<section>\n<h1>{}</h1>\n<p>Learn, grow, and achieve with quality education.</p>\n<h2>Our courses</h2>\n{}\n</section>",
        SITE_NAME,
        course_grid(ctx, courses)
    );
    layout(ctx, meta, &content)
}

pub fn courses_page(ctx: &PageContext, meta: &PageMetadata, courses: &[Course]) -> String {
    let content = format!(
        "<section>\n<h1>Our courses</h1>\n{}\n</section>",
        course_grid(ctx, courses)
    );
    layout(ctx, meta, &content)
}

fn enroll_cta(ctx: &PageContext, course: &Course, cta: CtaState) -> String {
    match cta {
        CtaState::Closed => {
            r#"<span class="cta cta-closed" aria-disabled="true">Enrollment closed</span>"#
                .to_string()
        }
        CtaState::AlreadyEnrolled => {
            r#"<span class="cta cta-pending" aria-disabled="true">Already enrolled (pending review)</span>"#
                .to_string()
        }
        CtaState::CanEnroll => format!(
            r#"<a class="cta" href="{}">Enroll now</a>"#,
            escape(&ctx.href(&format!("enroll/{}", course.slug)))
        ),
    }
}

pub fn course_detail_page(
    ctx: &PageContext,
    meta: &PageMetadata,
    course: &Course,
    cta: CtaState,
) -> String {
    let unknown = || "Unknown".to_string();
    let schedule = format::format_schedule_summary(&course.schedules);
    let schedule_row = if schedule.is_empty() {
        String::new()
    } else {
        format!("<dt>Schedule</dt><dd>{}</dd>", escape(&schedule))
    };
    let hours_row = format::hours_label(course.total_hours)
        .map(|h| format!("<dt>Total hours</dt><dd>{}</dd>", escape(&h)))
        .unwrap_or_default();

    let content = format!(
        r#"<p><a href="{back}">&larr; Back to classes</a></p>
<article class="course-detail">
<span class="subject">{subject}</span>
<h1>{title}</h1>
<p>Detailed course content is coming soon.</p>
</article>
<aside>
<h2>Class information</h2>
<dl>
<dt>Class type</dt><dd>{course_type}</dd>
<dt>Duration</dt><dd>{duration}</dd>
<dt>Start date</dt><dd>{start}</dd>
<dt>Status</dt><dd class="status status-{status_class}">{status}</dd>
<dt>Monthly fee</dt><dd>{monthly}</dd>
<dt>Total fee</dt><dd>{total}</dd>
{hours_row}{schedule_row}
</dl>
{cta}
</aside>"#,
        back = ctx.href("courses"),
        subject = escape(course.subject.as_ref().map_or("Course", |s| s.name.as_str())),
        title = escape(&course.title),
        course_type = escape(&format::course_type_label(course.course_type.as_deref())),
        duration = escape(&format::duration_label(course).unwrap_or_else(unknown)),
        start = escape(&format::optional_date_label(course.start_date.as_deref())),
        status_class = escape(course.status.as_deref().unwrap_or("unknown")),
        status = escape(&format::status_label(course.status.as_deref())),
        monthly = escape(&format::fee_label(course.monthly_fee)),
        total = escape(&format::fee_label(course.total_fee)),
        cta = enroll_cta(ctx, course, cta),
    );
    layout(ctx, meta, &content)
}

fn article_card(ctx: &PageContext, article: &Article) -> String {
    let mut extra = String::new();
    if let Some(category) = &article.category {
        let _ = write!(extra, r#"<span class="category">{}</span>"#, escape(category));
    }
    if let Some(published) = &article.published_at {
        let _ = write!(extra, "<time>{}</time>", escape(&format::format_date(published)));
    }
    if let Some(excerpt) = article.excerpt.as_deref().filter(|e| !e.trim().is_empty()) {
        let _ = write!(extra, "<p>{}</p>", escape(excerpt.trim()));
    }
    format!(
        r#"<li class="article-card"><a href="{}"><h3>{}</h3>{}</a></li>"#,
        escape(&ctx.href(&format!("articles/{}", article.slug))),
        escape(&article.title),
        extra
    )
}

pub fn articles_page(ctx: &PageContext, meta: &PageMetadata, articles: &[Article]) -> String {
    let grid = if articles.is_empty() {
        r#"<p class="empty">No articles yet.</p>"#.to_string()
    } else {
        let cards: String = articles.iter().map(|a| article_card(ctx, a)).collect();
        format!(r#"<ul class="article-grid">{cards}</ul>"#)
    };
    let content = format!(
        "<section>\n<h1>Articles</h1>\n<p>News, tips and announcements from {SITE_NAME}.</p>\n{grid}\n</section>"
    );
    layout(ctx, meta, &content)
}

/// Facebook and Telegram share links for an absolute page URL.
pub fn share_links(share_url: &str, title: &str) -> (String, String) {
    let encoded = encode_component(share_url);
    (
        format!("https://www.facebook.com/sharer/sharer.php?u={encoded}"),
        format!(
            "https://t.me/share/url?url={encoded}&text={}",
            encode_component(title)
        ),
    )
}

pub fn article_detail_page(
    ctx: &PageContext,
    meta: &PageMetadata,
    article: &Article,
    share_url: &str,
) -> String {
    let (facebook, telegram) = share_links(share_url, &article.title);

    let mut byline = String::new();
    if let Some(category) = &article.category {
        let _ = write!(byline, r#"<span class="category">{}</span>"#, escape(category));
    }
    if let Some(published) = &article.published_at {
        let _ = write!(
            byline,
            "<p>Published on <time>{}</time></p>",
            escape(&format::format_date(published))
        );
    }
    let image = article
        .image_url
        .as_deref()
        .map(|src| format!(r#"<img src="{}" alt="{}">"#, escape(src), escape(&article.title)))
        .unwrap_or_default();
    // Trusted CMS markup, inserted as-is.
    let body = article
        .body
        .as_deref()
        .map(|html| format!(r#"<div class="article-body">{html}</div>"#))
        .unwrap_or_default();

    let content = format!(
        r#"<p><a href="{back}">&larr; Back to articles</a></p>
<article>
<h1>{title}</h1>
<div class="byline">{byline}</div>
<div class="share">
<a href="{facebook}" target="_blank" rel="noopener noreferrer">Share on Facebook</a>
<a href="{telegram}" target="_blank" rel="noopener noreferrer">Share on Telegram</a>
<input type="text" readonly value="{share_url}" aria-label="Article link">
</div>
{image}
{body}
</article>"#,
        back = ctx.href("articles"),
        title = escape(&article.title),
        facebook = escape(&facebook),
        telegram = escape(&telegram),
        share_url = escape(share_url),
    );
    layout(ctx, meta, &content)
}

// --- Auth ---

/// Link that starts Google login and returns to `return_to` afterwards.
pub fn google_login_href(locale: Locale, return_to: &str) -> String {
    format!(
        "{}?redirect_to={}",
        locale.href("login/google"),
        encode_component(return_to)
    )
}

pub fn login_page(ctx: &PageContext, meta: &PageMetadata) -> String {
    let content = format!(
        r#"<section class="login">
<h1>Student login</h1>
<p>Sign in with your Google account to enroll in courses and follow your requests.</p>
<a class="cta" href="{}">Continue with Google</a>
</section>"#,
        escape(&google_login_href(ctx.locale, &ctx.href("")))
    );
    layout(ctx, meta, &content)
}

// --- Enrollment ---

/// Notice
///
/// A banner at the top of the enrollment form.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Info(String),
    Success(String),
    Pending(String),
    Error(String),
}

impl Notice {
    fn render(&self) -> String {
        let (class, text) = match self {
            Notice::Info(t) => ("info", t),
            Notice::Success(t) => ("success", t),
            Notice::Pending(t) => ("pending", t),
            Notice::Error(t) => ("error", t),
        };
        format!(
            r#"<div class="notice notice-{class}" role="status">{}</div>"#,
            escape(text)
        )
    }
}

pub const CLOSED_NOTICE: &str = "Enrollment for this course is closed.";

pub const PENDING_NOTICE: &str =
    "You already have a pending enrollment request for this course. We will contact you soon.";

/// EnrollView
///
/// Everything the enrollment page needs. `logged_in = false` renders the login prompt
/// instead of the form.
#[derive(Debug, Clone, Default)]
pub struct EnrollView {
    pub logged_in: bool,
    /// Enrollment window has ended; no form is offered.
    pub closed: bool,
    pub notices: Vec<Notice>,
    pub values: EnrollmentFormValues,
    pub field_errors: FieldErrors,
    /// Where the logout button sends the student afterwards.
    pub return_to: String,
}

fn field_error(errors: &FieldErrors, field: &str) -> String {
    errors
        .get(field)
        .and_then(|messages| messages.first())
        .map(|m| format!(r#"<span class="field-error">{}</span>"#, escape(m)))
        .unwrap_or_default()
}

fn text_input(label: &str, name: &str, value: &str, errors: &FieldErrors) -> String {
    format!(
        r#"<label>{label}<input name="{name}" value="{value}" required>{error}</label>"#,
        value = escape(value),
        error = field_error(errors, name),
    )
}

fn enrollment_form(ctx: &PageContext, course: &Course, view: &EnrollView) -> String {
    let values = &view.values;
    let errors = &view.field_errors;

    let class_options: String = CLASS_OPTIONS
        .iter()
        .map(|option| {
            let selected = if values.class_interest == *option { " selected" } else { "" };
            format!(r#"<option value="{0}"{selected}>{0}</option>"#, escape(option))
        })
        .collect();
    let school_options: String = SchoolType::ALL
        .iter()
        .map(|school| {
            let selected = if values.school_type == school.as_str() { " selected" } else { "" };
            format!(
                r#"<option value="{}"{selected}>{}</option>"#,
                school.as_str(),
                school.label()
            )
        })
        .collect();

    format!(
        r#"<form method="post" action="{action}" class="enrollment-form">
<label>Course<input value="{course_title}" disabled></label>
<label>Subject<input value="{subject}" disabled></label>
{name}
<label>Age<input type="number" min="1" name="age" value="{age}" required>{age_error}</label>
{education}
<label>Class<select name="class_interest" required>{class_options}</select>{class_error}</label>
<label>School<select name="school_type" required>{school_options}</select>{school_error}</label>
<label>School name (if other)<input name="school_other" value="{school_other}">{school_other_error}</label>
{facebook}
{phone}
{town}
<button type="submit">Submit</button>
</form>
<form method="post" action="{logout}" class="logout-form">
<input type="hidden" name="redirect_to" value="{return_to}">
<button type="submit">Log out</button>
</form>"#,
        action = escape(&ctx.href(&format!("enroll/{}", course.slug))),
        course_title = escape(&course.title),
        subject = escape(course.subject.as_ref().map_or("Course", |s| s.name.as_str())),
        name = text_input("Name (English)", "name_en", &values.name_en, errors),
        age = escape(&values.age),
        age_error = field_error(errors, "age"),
        education = text_input("Education", "education", &values.education, errors),
        class_error = field_error(errors, "class_interest"),
        school_error = field_error(errors, "school_type"),
        school_other = escape(&values.school_other),
        school_other_error = field_error(errors, "school_other"),
        facebook = text_input("Facebook account", "facebook_account", &values.facebook_account, errors),
        phone = text_input("Phone", "phone", &values.phone, errors),
        town = text_input("Town / address", "town_address", &values.town_address, errors),
        logout = ctx.href("logout"),
        return_to = escape(&view.return_to),
    )
}

pub fn enroll_page(
    ctx: &PageContext,
    meta: &PageMetadata,
    course: &Course,
    view: &EnrollView,
) -> String {
    let notices: String = view.notices.iter().map(Notice::render).collect();
    let mut heading = format!("<h1>Enroll in {}</h1>", escape(&course.title));
    let mut summary = escape(course.subject.as_ref().map_or("Course", |s| s.name.as_str()));
    if let Some(fee) = course.monthly_fee {
        summary.push_str(&format!(" · {}/month", escape(&format::format_mmk(fee))));
    }
    let _ = write!(heading, "<p>{summary}</p>");

    let body = if view.closed {
        format!(r#"<p class="closed">{CLOSED_NOTICE}</p>"#)
    } else if view.logged_in {
        enrollment_form(ctx, course, view)
    } else {
        format!(
            r#"<div class="login-prompt">
<p>Please sign in with Google to submit an enrollment request.</p>
<a class="cta" href="{}">Continue with Google</a>
</div>"#,
            escape(&google_login_href(ctx.locale, &ctx.path))
        )
    };

    let content = format!(
        r#"<section class="enroll">
{heading}
{notices}
{body}
<p><a href="{back}">Back to course</a></p>
</section>"#,
        back = escape(&ctx.href(&format!("courses/{}", course.slug))),
    );
    layout(ctx, meta, &content)
}

pub fn enroll_success_page(ctx: &PageContext, meta: &PageMetadata, status: &SuccessStatus) -> String {
    let content = match status {
        SuccessStatus::Success { course_name } => format!(
            r#"<section class="enroll-success">
<h1>Enrollment request submitted</h1>
<p>Your request for <strong>{}</strong> has been received and is pending review. We will contact you soon.</p>
<a class="cta" href="{}">Browse more courses</a>
<a href="{}">Home</a>
</section>"#,
            escape(course_name),
            ctx.href("courses"),
            ctx.href("")
        ),
        SuccessStatus::NotFound => format!(
            r#"<section class="enroll-success">
<h1>No enrollment request found</h1>
<p>We could not find a pending request for this course.</p>
<a class="cta" href="{}">Browse courses</a>
</section>"#,
            ctx.href("courses")
        ),
        SuccessStatus::Unauthenticated => {
            let mut return_to = ctx.path.clone();
            if let Some(query) = ctx.query.as_deref().filter(|q| !q.is_empty()) {
                return_to.push('?');
                return_to.push_str(query);
            }
            format!(
                r#"<section class="enroll-success">
<h1>Please sign in</h1>
<p>Sign in to see the status of your enrollment request.</p>
<a class="cta" href="{}">Continue with Google</a>
</section>"#,
                escape(&google_login_href(ctx.locale, &return_to))
            )
        }
    };
    layout(ctx, meta, &content)
}

// --- Static ---

pub fn contact_page(ctx: &PageContext, meta: &PageMetadata) -> String {
    let content = format!(
        "<section>\n<h1>Contact us</h1>\n<p>Questions about a course or your enrollment? Reach {SITE_NAME} through our Facebook page or visit the school during office hours.</p>\n</section>"
    );
    layout(ctx, meta, &content)
}

pub fn privacy_page(ctx: &PageContext, meta: &PageMetadata) -> String {
    let content = format!(
        "<section>\n<h1>Privacy policy</h1>\n<p>{SITE_NAME} uses your Google account name and email only to identify you when you enroll. Enrollment details are shared with our staff to process your request and are never sold.</p>\n<p>This site stores a single session cookie while you are signed in.</p>\n</section>"
    );
    layout(ctx, meta, &content)
}

pub fn not_found_page(ctx: &PageContext, meta: &PageMetadata) -> String {
    let content = format!(
        r#"<section class="not-found">
<h1>Page not found</h1>
<p>The page you are looking for does not exist or has moved.</p>
<a href="{}">Go home</a>
</section>"#,
        ctx.href("")
    );
    layout(ctx, meta, &content)
}
